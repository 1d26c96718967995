//! Elements: data series drawn as line traces or bars.
//!
//! An element holds parallel `x`/`y` value arrays; its point count is the
//! shorter of the two. Each point is drawn with a pen picked from the style
//! palette by its weight, and active points are drawn again on top with the
//! active pen.
use core::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::axis::{Axis2d, AxisScale};
use crate::error::GraphError;
use crate::geometry::{Point2d, Region2d, Segment2d};
use crate::id::ShapeId;
use crate::painter::Painter;
use crate::pen::{Pen, PenOptions};
use crate::postscript::PsWriter;
use crate::style::{self, PenStyle};
use crate::transform::MapContext;

pub mod bar;
pub mod line;

pub use bar::BarAttrs;
pub use line::TraceAttrs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Line,
    Bar,
}

impl ElementKind {
    /// Class name, used as the default binding tag.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Line => "LineElement",
            Self::Bar => "BarElement",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(Self::Line),
            "bar" => Ok(Self::Bar),
            _ => Err(GraphError::invalid("type", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementAttrs {
    Line(TraceAttrs),
    Bar(BarAttrs),
}

impl ElementAttrs {
    pub fn defaults(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Line => Self::Line(TraceAttrs::default()),
            ElementKind::Bar => Self::Bar(BarAttrs::default()),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Line(_) => ElementKind::Line,
            Self::Bar(_) => ElementKind::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementOptions {
    /// Legend label. `None` uses the element name, an empty string omits the
    /// element from the legend.
    pub label: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Per-point weights used to pick pens from `styles`.
    pub weights: Option<Vec<f64>>,
    pub axes: Axis2d,
    /// Built-in normal pen, used unless `pen_name` is set.
    pub pen: PenOptions,
    /// Built-in active pen, used unless `active_pen_name` is set.
    pub active_pen: PenOptions,
    pub pen_name: Option<String>,
    pub active_pen_name: Option<String>,
    pub styles: Vec<PenStyle>,
    pub hide: bool,
    /// Binding tags. `None` uses the element's name, class name and `"all"`.
    pub bind_tags: Option<Vec<String>>,
    pub attrs: ElementAttrs,
}

impl ElementOptions {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            label: None,
            x: Vec::new(),
            y: Vec::new(),
            weights: None,
            axes: Axis2d::default(),
            pen: PenOptions::default(),
            active_pen: PenOptions::active(),
            pen_name: None,
            active_pen_name: None,
            styles: Vec::new(),
            hide: false,
            bind_tags: None,
            attrs: ElementAttrs::defaults(kind),
        }
    }

    /// Set both value arrays from `(x, y)` pairs.
    pub fn set_points(&mut self, points: &[(f64, f64)]) {
        self.x = points.iter().map(|p| p.0).collect();
        self.y = points.iter().map(|p| p.1).collect();
    }

    /// Number of data points: excess values in the longer array are ignored.
    pub fn point_count(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    /// Names of every pen these options refer to.
    pub(crate) fn pen_names(&self) -> impl Iterator<Item = &str> {
        self.pen_name
            .iter()
            .chain(self.active_pen_name.iter())
            .map(String::as_str)
            .chain(self.styles.iter().map(|s| s.pen.as_str()))
    }
}

/// A data point after mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedPoint {
    pub index: usize,
    pub screen: Point2d,
    /// Palette slot; 0 is the normal pen.
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyledSegment {
    pub segment: Segment2d,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedBar {
    pub index: usize,
    pub rect: Region2d,
    pub slot: usize,
}

/// Cached screen geometry of an element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementGeometry {
    /// Every finite data point, in index order.
    pub points: Vec<MappedPoint>,
    /// Clipped trace pieces (line elements).
    pub traces: Vec<StyledSegment>,
    /// Clipped rectangles (bar elements).
    pub bars: Vec<MappedBar>,
}

/// Result of a nearest point search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub index: usize,
    /// Screen distance from the sample.
    pub distance: f64,
    /// Screen position of the match.
    pub screen: Point2d,
    /// Data-space position of the match.
    pub point: Point2d,
}

/// Which points are drawn with the active pen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Activation {
    #[default]
    None,
    All,
    Points(Vec<usize>),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) id: ShapeId,
    pub(crate) name: String,
    kind: ElementKind,
    pub(crate) options: ElementOptions,
    geometry: ElementGeometry,
    pub(crate) activation: Activation,
    pub(crate) needs_remap: bool,
}

fn extent(values: impl Iterator<Item = f64>, scale: AxisScale) -> Option<(f64, f64)> {
    values
        .filter(|v| scale.data_to_axis(*v).is_some())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

impl Element {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: ShapeId::new(),
            name: name.into(),
            kind,
            options: ElementOptions::new(kind),
            geometry: ElementGeometry::default(),
            activation: Activation::None,
            needs_remap: true,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn options(&self) -> &ElementOptions {
        &self.options
    }

    pub fn geometry(&self) -> &ElementGeometry {
        &self.geometry
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    /// Label shown in the legend, if any.
    pub fn legend_label(&self) -> Option<&str> {
        match self.options.label.as_deref() {
            None => Some(&self.name),
            Some("") => None,
            Some(label) => Some(label),
        }
    }

    pub(crate) fn tags(&self) -> Vec<String> {
        match &self.options.bind_tags {
            Some(tags) => tags.clone(),
            None => vec![
                self.name.clone(),
                self.kind.class_name().to_string(),
                "all".to_string(),
            ],
        }
    }

    /// Validate the options against the graph's pens.
    pub(crate) fn configure(&self, pens: &IndexMap<String, Pen>) -> Result<(), GraphError> {
        let found = self.options.attrs.kind();
        if found != self.kind {
            return Err(GraphError::KindMismatch {
                name: self.name.clone(),
                expected: self.kind.as_str(),
                found: found.as_str(),
            });
        }
        if let Some(missing) = self.options.pen_names().find(|n| !pens.contains_key(*n)) {
            return Err(GraphError::UnknownPen(missing.to_string()));
        }
        self.options.pen.validate()?;
        self.options.active_pen.validate()?;
        match &self.options.attrs {
            ElementAttrs::Bar(attrs) => attrs.validate(),
            ElementAttrs::Line(_) => Ok(()),
        }
    }

    /// Data extents along the x and y axes, skipping values the axis scales
    /// cannot show.
    pub(crate) fn data_extents(
        &self,
        x_scale: AxisScale,
        y_scale: AxisScale,
    ) -> (Option<(f64, f64)>, Option<(f64, f64)>) {
        let n = self.options.point_count();
        let finite = |i: &usize| self.options.x[*i].is_finite() && self.options.y[*i].is_finite();
        let xs = (0..n).filter(finite).map(|i| self.options.x[i]);
        let ys = (0..n).filter(finite).map(|i| self.options.y[i]);
        match &self.options.attrs {
            ElementAttrs::Line(_) => (extent(xs, x_scale), extent(ys, y_scale)),
            ElementAttrs::Bar(attrs) => {
                let half = attrs.bar_width * 0.5;
                let x = extent(xs, x_scale).map(|(lo, hi)| (lo - half, hi + half));
                let y = extent(ys.chain(std::iter::once(attrs.base)), y_scale);
                (x, y)
            }
        }
    }

    /// Recompute screen geometry.
    pub(crate) fn map(&mut self, ctx: &MapContext<'_>) {
        self.needs_remap = false;
        let count = self.options.point_count();
        let slots = style::style_map(&self.options.styles, self.options.weights.as_deref(), count);
        self.geometry = match &self.options.attrs {
            ElementAttrs::Line(attrs) => line::map(&self.options, attrs, &slots, ctx),
            ElementAttrs::Bar(attrs) => bar::map(&self.options, attrs, &slots, ctx),
        };
        log::trace!(
            "mapped {} element \"{}\": {} points",
            self.kind,
            self.name,
            self.geometry.points.len()
        );
    }

    /// Nearest data point to `sample`, within `halo` pixels. With
    /// `interpolate`, line elements also match points along their trace.
    pub fn closest(
        &self,
        sample: Point2d,
        halo: f64,
        interpolate: bool,
        ctx: &MapContext<'_>,
    ) -> Option<Nearest> {
        if self.options.hide {
            return None;
        }
        let nearest = match &self.options.attrs {
            ElementAttrs::Line(_) => {
                line::closest(&self.geometry, &self.options, sample, interpolate, ctx)
            }
            ElementAttrs::Bar(_) => bar::closest(&self.geometry, &self.options, sample),
        }?;
        (nearest.distance <= halo).then_some(nearest)
    }

    pub fn region_in(&self, region: &Region2d, enclosed: bool) -> bool {
        match &self.options.attrs {
            ElementAttrs::Line(_) => line::region_in(&self.geometry, region, enclosed),
            ElementAttrs::Bar(_) => bar::region_in(&self.geometry, region, enclosed),
        }
    }

    fn pen<'a>(&'a self, slot: usize, pens: &'a IndexMap<String, Pen>) -> &'a PenOptions {
        let normal = self
            .options
            .pen_name
            .as_ref()
            .and_then(|n| pens.get(n))
            .map_or(&self.options.pen, |p| &p.options);
        if slot == 0 {
            return normal;
        }
        self.options
            .styles
            .get(slot - 1)
            .and_then(|s| pens.get(&s.pen))
            .map_or(normal, |p| &p.options)
    }

    fn active_pen<'a>(&'a self, pens: &'a IndexMap<String, Pen>) -> &'a PenOptions {
        self.options
            .active_pen_name
            .as_ref()
            .and_then(|n| pens.get(n))
            .map_or(&self.options.active_pen, |p| &p.options)
    }

    fn is_active(&self, index: usize) -> bool {
        match &self.activation {
            Activation::None => false,
            Activation::All => true,
            Activation::Points(list) => list.contains(&index),
        }
    }

    pub fn draw(&self, pens: &IndexMap<String, Pen>, plot: &Region2d, painter: &mut dyn Painter) {
        if self.options.hide {
            return;
        }
        let slots = self.options.styles.len() + 1;
        for slot in 0..slots {
            let pen = self.pen(slot, pens);
            match &self.options.attrs {
                ElementAttrs::Line(_) => line::draw_slot(&self.geometry, slot, pen, plot, painter),
                ElementAttrs::Bar(_) => bar::draw_bars(
                    self.geometry.bars.iter().filter(|b| b.slot == slot),
                    pen,
                    painter,
                ),
            }
        }
        if self.activation == Activation::None {
            return;
        }
        let active = self.active_pen(pens);
        match &self.options.attrs {
            ElementAttrs::Line(_) => {
                let points: Vec<&MappedPoint> = self
                    .geometry
                    .points
                    .iter()
                    .filter(|p| self.is_active(p.index))
                    .collect();
                line::draw_points(&points, active, plot, painter);
            }
            ElementAttrs::Bar(_) => bar::draw_bars(
                self.geometry.bars.iter().filter(|b| self.is_active(b.index)),
                active,
                painter,
            ),
        }
    }

    /// Draw the element's legend swatch centered on `center`.
    pub fn draw_legend_symbol(
        &self,
        pens: &IndexMap<String, Pen>,
        center: Point2d,
        size: f64,
        painter: &mut dyn Painter,
    ) {
        let pen = self.pen(0, pens);
        match &self.options.attrs {
            ElementAttrs::Line(_) => line::draw_legend_symbol(pen, center, size, painter),
            ElementAttrs::Bar(_) => bar::draw_legend_symbol(pen, center, size, painter),
        }
    }

    pub fn postscript(&self, pens: &IndexMap<String, Pen>, plot: &Region2d, ps: &mut PsWriter) {
        if self.options.hide {
            return;
        }
        ps.comment(&format!("{} \"{}\"", self.kind.class_name(), self.name));
        self.draw(pens, plot, ps);
    }
}
