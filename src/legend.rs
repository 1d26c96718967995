use indexmap::IndexMap;

use crate::Color;
use crate::element::Element;
use crate::error::GraphError;
use crate::geometry::{Anchor, Point2d, Region2d};
use crate::id::ShapeId;
use crate::painter::{Font, Painter, TextMeasurer, TextStyle};
use crate::pen::{Dashes, Paint, Pen};

/// Where the legend is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPosition {
    #[default]
    Right,
    Left,
    Top,
    Bottom,
    /// Inside the plot area, at the legend's anchor.
    PlotArea,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendOptions {
    pub hide: bool,
    pub position: LegendPosition,
    /// Corner of the plot area used with [`LegendPosition::PlotArea`].
    pub anchor: Anchor,
    pub font: Font,
    pub foreground: Color,
    pub background: Option<Color>,
    pub border: Option<Color>,
    pub padding: f64,
    /// Size of the entry swatches.
    pub symbol_size: f64,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            hide: false,
            position: LegendPosition::Right,
            anchor: Anchor::NorthEast,
            font: Font::default(),
            foreground: Color::BLACK,
            background: None,
            border: None,
            padding: 4.0,
            symbol_size: 10.0,
        }
    }
}

impl LegendOptions {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if self.padding.is_nan() || self.padding < 0.0 {
            return Err(GraphError::invalid("padding", self.padding));
        }
        if self.symbol_size.is_nan() || self.symbol_size < 0.0 {
            return Err(GraphError::invalid("symbolsize", self.symbol_size));
        }
        Ok(())
    }
}

/// An entry in the legend.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LegendEntry {
    pub(crate) id: ShapeId,
    pub(crate) label: String,
    /// Height of this row.
    pub(crate) height: f64,
}

/// Legend of the elements shown in the graph.
#[derive(Debug, Clone, Default)]
pub struct Legend {
    pub options: LegendOptions,
    entries: Vec<LegendEntry>,
    width: f64,
    height: f64,
    region: Option<Region2d>,
}

impl Legend {
    pub fn new(options: LegendOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Rebuild the entries from the visible, labelled elements in display order
    /// and measure the legend.
    pub(crate) fn update(&mut self, elements: &IndexMap<ShapeId, Element>, measure: &TextMeasurer) {
        self.entries.clear();
        self.width = 0.0;
        self.height = 0.0;
        self.region = None;
        if self.options.hide {
            return;
        }
        let sym = self.options.symbol_size;
        let mut text_width: f64 = 0.0;
        for e in elements.values().filter(|e| !e.options.hide) {
            let Some(label) = e.legend_label() else {
                continue;
            };
            let (w, h) = measure(label, &self.options.font);
            text_width = text_width.max(w);
            self.entries.push(LegendEntry {
                id: e.id,
                label: label.to_string(),
                height: h.max(sym) + self.options.padding,
            });
        }
        if self.entries.is_empty() {
            return;
        }
        let pad = self.options.padding;
        self.width = pad * 3.0 + sym * 2.0 + text_width;
        self.height = pad + self.entries.iter().map(|e| e.height).sum::<f64>();
    }

    /// Space the legend needs, or zero if it shows nothing.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn region(&self) -> Option<Region2d> {
        self.region
    }

    pub(crate) fn place(&mut self, top_left: Point2d) {
        self.region = (!self.entries.is_empty()).then(|| {
            Region2d::new(
                top_left.x,
                top_left.y,
                top_left.x + self.width,
                top_left.y + self.height,
            )
        });
    }

    /// Rows of the placed legend, with their entries.
    fn rows(&self) -> impl Iterator<Item = (&LegendEntry, Region2d)> {
        let mut y = self.region.map_or(0.0, |r| r.top + self.options.padding * 0.5);
        let (left, right) = self.region.map_or((0.0, 0.0), |r| (r.left, r.right));
        self.entries.iter().map(move |e| {
            let row = Region2d::new(left, y, right, y + e.height);
            y += e.height;
            (e, row)
        })
    }

    /// Element whose legend entry lies under `p`.
    pub fn entry_at(&self, p: Point2d) -> Option<ShapeId> {
        if !self.region?.contains(p) {
            return None;
        }
        self.rows().find(|(_, row)| row.contains(p)).map(|(e, _)| e.id)
    }

    pub(crate) fn draw(
        &self,
        elements: &IndexMap<ShapeId, Element>,
        pens: &IndexMap<String, Pen>,
        painter: &mut dyn Painter,
    ) {
        let Some(region) = self.region else {
            return;
        };
        if let Some(bg) = self.options.background {
            painter.draw_rectangle(&region, &Paint::fill(bg));
        }
        if let Some(border) = self.options.border {
            painter.draw_rectangle(
                &region,
                &Paint {
                    stroke: Some(border),
                    fill: None,
                    width: 1.0,
                    dashes: Dashes::Solid.segments(),
                },
            );
        }
        let pad = self.options.padding;
        let sym = self.options.symbol_size;
        let style = TextStyle {
            color: self.options.foreground,
            font: self.options.font.clone(),
            angle: 0.0,
        };
        let measure_width = region.width() - pad * 3.0 - sym * 2.0;
        for (entry, row) in self.rows() {
            let cy = row.center().y;
            if let Some(element) = elements.get(&entry.id) {
                let center = Point2d::new(row.left + pad + sym, cy);
                element.draw_legend_symbol(pens, center, sym, painter);
            }
            let text_center = Point2d::new(
                row.left + pad * 2.0 + sym * 2.0 + measure_width * 0.5,
                cy,
            );
            painter.draw_text(&entry.label, text_center, &style);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::element::ElementKind;

    fn elements() -> IndexMap<ShapeId, Element> {
        let mut out = IndexMap::new();
        for (name, label, hide) in [
            ("a", None, false),
            ("b", Some("Bee"), false),
            ("c", Some(""), false),
            ("d", None, true),
        ] {
            let mut e = Element::new(name, ElementKind::Line);
            e.options.label = label.map(str::to_string);
            e.options.hide = hide;
            out.insert(e.id, e);
        }
        out
    }

    fn measure() -> TextMeasurer {
        Arc::new(|text: &str, _: &Font| (10.0 * text.len() as f64, 12.0))
    }

    #[test]
    fn entries_skip_hidden_and_unlabelled() {
        let elements = elements();
        let mut legend = Legend::new(LegendOptions::default());
        legend.update(&elements, &measure());
        let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "Bee"]);
        // 3 paddings + two swatch widths + widest label.
        assert_eq!(legend.size(), (4.0 * 3.0 + 20.0 + 30.0, 4.0 + 2.0 * 16.0));
    }

    #[test]
    fn hit_testing_rows() {
        let elements = elements();
        let mut legend = Legend::new(LegendOptions::default());
        legend.update(&elements, &measure());
        legend.place(Point2d::new(100.0, 0.0));
        let ids: Vec<ShapeId> = elements.keys().copied().collect();
        assert_eq!(legend.entry_at(Point2d::new(110.0, 5.0)), Some(ids[0]));
        assert_eq!(legend.entry_at(Point2d::new(110.0, 25.0)), Some(ids[1]));
        assert_eq!(legend.entry_at(Point2d::new(90.0, 5.0)), None);
    }

    #[test]
    fn hidden_legend_takes_no_space() {
        let mut legend = Legend::new(LegendOptions {
            hide: true,
            ..LegendOptions::default()
        });
        legend.update(&elements(), &measure());
        legend.place(Point2d::ZERO);
        assert_eq!(legend.size(), (0.0, 0.0));
        assert_eq!(legend.region(), None);
    }
}
