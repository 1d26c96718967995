use std::sync::Arc;

use crate::Color;
use crate::element::{ElementKind, ElementOptions};
use crate::error::GraphError;
use crate::graph::{Graph, GraphOptions, Margins};
use crate::legend::LegendOptions;
use crate::marker::MarkerOptions;
use crate::painter::Font;
use crate::pen::PenOptions;

/// Builder for configuring and constructing a [`Graph`].
///
/// Collects widget options, axis limits, pens, elements and markers, then
/// creates them in that order so elements can refer to the pens and markers
/// to the elements. All settings have defaults.
///
/// # Example
///
/// ```ignore
/// let graph = GraphBuilder::new()
///     .with_size(640.0, 480.0)
///     .with_x_label("Time (s)")
///     .with_y_lim(-1.0, 1.0)
///     .add_element(ElementKind::Line, "signal", options)
///     .build()?;
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    options: GraphOptions,
    x_label: Option<String>,
    y_label: Option<String>,
    x_lim: Option<(f64, f64)>,
    y_lim: Option<(f64, f64)>,
    pens: Vec<(String, PenOptions)>,
    elements: Vec<(ElementKind, String, ElementOptions)>,
    markers: Vec<(Option<String>, MarkerOptions)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widget size in pixels.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.options.width = width;
        self.options.height = height;
        self
    }

    /// Space between the widget edges and the plot area.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.options.margins = margins;
        self
    }

    /// Swap the x and y axes: x runs vertically and bars grow sideways.
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.options.inverted = inverted;
        self
    }

    /// Pick distance in pixels.
    pub fn with_halo(mut self, halo: f64) -> Self {
        self.options.halo = halo;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let t = title.into();
        if !t.is_empty() {
            self.options.title = Some(t);
        }
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.options.background = color;
        self
    }

    pub fn with_plot_background(mut self, color: Color) -> Self {
        self.options.plot_background = Some(color);
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.options.font = font;
        self
    }

    pub fn with_legend(mut self, legend: LegendOptions) -> Self {
        self.options.legend = legend;
        self
    }

    /// Provide the text measurer used for layout of text markers, tick
    /// labels and the legend. Called with the text and font and should
    /// return (width, height) in pixels.
    pub fn with_text_measurer<F>(mut self, measure: F) -> Self
    where
        F: Fn(&str, &Font) -> (f64, f64) + Send + Sync + 'static,
    {
        self.options.measure = Arc::new(measure);
        self
    }

    /// Set the title of the `x` axis.
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        let l = label.into();
        if !l.is_empty() {
            self.x_label = Some(l);
        }
        self
    }

    /// Set the title of the `y` axis.
    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        let l = label.into();
        if !l.is_empty() {
            self.y_label = Some(l);
        }
        self
    }

    /// Fix the `x` axis limits instead of autoscaling.
    pub fn with_x_lim(mut self, min: f64, max: f64) -> Self {
        self.x_lim = Some((min, max));
        self
    }

    /// Fix the `y` axis limits instead of autoscaling.
    pub fn with_y_lim(mut self, min: f64, max: f64) -> Self {
        self.y_lim = Some((min, max));
        self
    }

    pub fn add_pen(mut self, name: impl Into<String>, pen: PenOptions) -> Self {
        self.pens.push((name.into(), pen));
        self
    }

    pub fn add_element(
        mut self,
        kind: ElementKind,
        name: impl Into<String>,
        options: ElementOptions,
    ) -> Self {
        self.elements.push((kind, name.into(), options));
        self
    }

    /// Add a marker. Its kind is taken from the options' attributes.
    pub fn add_marker(mut self, name: Option<&str>, options: MarkerOptions) -> Self {
        self.markers.push((name.map(str::to_string), options));
        self
    }

    /// Build the graph, validating everything through the same checks as
    /// the graph's own create and configure calls.
    pub fn build(self) -> Result<Graph, GraphError> {
        self.options.validate()?;
        let mut g = Graph::new(self.options);

        for (axis, label, lim) in [("x", self.x_label, self.x_lim), ("y", self.y_label, self.y_lim)] {
            if label.is_none() && lim.is_none() {
                continue;
            }
            g.configure_axis(axis, |o| {
                if label.is_some() {
                    o.title = label;
                }
                if let Some((min, max)) = lim {
                    o.min = Some(min);
                    o.max = Some(max);
                }
            })?;
        }
        for (name, pen) in self.pens {
            g.create_pen(&name, |o| *o = pen)?;
        }
        for (kind, name, options) in self.elements {
            g.create_element(kind, &name, |o| *o = options)?;
        }
        for (name, options) in self.markers {
            let kind = options.attrs.kind();
            g.create_marker(kind, name.as_deref(), |o| *o = options)?;
        }
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2d;
    use crate::marker::MarkerKind;

    #[test]
    fn builds_objects_in_dependency_order() {
        let mut line = ElementOptions::new(ElementKind::Line);
        line.set_points(&[(0.0, 0.0), (1.0, 1.0)]);
        line.pen_name = Some("thick".to_string());
        let mut text = MarkerOptions::new(MarkerKind::Text);
        text.coords = vec![Point2d::new(0.5, 0.5)];
        text.element = Some("signal".to_string());

        let g = GraphBuilder::new()
            .with_size(300.0, 200.0)
            .with_x_label("time")
            .with_y_lim(-1.0, 1.0)
            .add_pen(
                "thick",
                PenOptions {
                    line_width: 3.0,
                    ..PenOptions::default()
                },
            )
            .add_element(ElementKind::Line, "signal", line)
            .add_marker(Some("note"), text)
            .build()
            .unwrap();

        assert_eq!(g.options().width, 300.0);
        assert_eq!(g.axis("x").unwrap().options.title.as_deref(), Some("time"));
        assert_eq!(g.axis("y").unwrap().options.max, Some(1.0));
        assert_eq!(g.element_names(), vec!["signal"]);
        assert_eq!(g.marker_kind("note"), Some(MarkerKind::Text));
    }

    #[test]
    fn invalid_limits_fail_the_build() {
        let err = GraphBuilder::new().with_x_lim(5.0, 1.0).build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidAxisLimits { .. }));
    }

    #[test]
    fn element_with_unknown_pen_fails_the_build() {
        let mut bar = ElementOptions::new(ElementKind::Bar);
        bar.pen_name = Some("missing".to_string());
        let err = GraphBuilder::new()
            .add_element(ElementKind::Bar, "b", bar)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownPen("missing".to_string()));
    }
}
