//! Markers: annotations positioned in data coordinates.
//!
//! A marker goes through `configure` (validate options, derive paint state),
//! `map` (compute screen geometry from its coordinates) and then
//! `draw`/`postscript` and hit testing against the cached geometry. The cache
//! is only valid after `map`; the graph remaps lazily whenever coordinates,
//! axes or the layout change.
use core::fmt;
use std::str::FromStr;

use crate::axis::Axis2d;
use crate::error::GraphError;
use crate::geometry::{Anchor, Point2d, Region2d};
use crate::id::ShapeId;
use crate::painter::{Painter, TextMeasurer};
use crate::postscript::PsWriter;
use crate::transform::MapContext;

pub mod bitmap;
pub mod line;
pub mod polygon;
pub mod text;
pub mod window;

pub use bitmap::{BitmapAttrs, BitmapGeometry};
pub use line::{LineAttrs, LineGeometry};
pub use polygon::{PolygonAttrs, PolygonGeometry};
pub use text::{TextAttrs, TextGeometry};
pub use window::{WindowAttrs, WindowGeometry, WindowHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Bitmap,
    Line,
    Polygon,
    Text,
    Window,
}

impl MarkerKind {
    /// Class name, used as the default binding tag.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Bitmap => "BitmapMarker",
            Self::Line => "LineMarker",
            Self::Polygon => "PolygonMarker",
            Self::Text => "TextMarker",
            Self::Window => "WindowMarker",
        }
    }

    /// Fewest coordinates the kind needs to have any geometry.
    pub fn min_points(self) -> usize {
        match self {
            Self::Line => 2,
            Self::Polygon => 3,
            Self::Bitmap | Self::Text | Self::Window => 1,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Bitmap => "bitmap",
            Self::Line => "line",
            Self::Polygon => "polygon",
            Self::Text => "text",
            Self::Window => "window",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bitmap" => Self::Bitmap,
            "line" => Self::Line,
            "polygon" => Self::Polygon,
            "text" => Self::Text,
            "window" => Self::Window,
            _ => return Err(GraphError::invalid("type", s)),
        })
    }
}

/// Interaction state of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerState {
    #[default]
    Normal,
    /// Drawn with the active colors.
    Active,
    /// Drawn normally but never picked.
    Disabled,
}

/// Kind-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerAttrs {
    Bitmap(BitmapAttrs),
    Line(LineAttrs),
    Polygon(PolygonAttrs),
    Text(TextAttrs),
    Window(WindowAttrs),
}

impl MarkerAttrs {
    pub fn defaults(kind: MarkerKind) -> Self {
        match kind {
            MarkerKind::Bitmap => Self::Bitmap(BitmapAttrs::default()),
            MarkerKind::Line => Self::Line(LineAttrs::default()),
            MarkerKind::Polygon => Self::Polygon(PolygonAttrs::default()),
            MarkerKind::Text => Self::Text(TextAttrs::default()),
            MarkerKind::Window => Self::Window(WindowAttrs::default()),
        }
    }

    pub fn kind(&self) -> MarkerKind {
        match self {
            Self::Bitmap(_) => MarkerKind::Bitmap,
            Self::Line(_) => MarkerKind::Line,
            Self::Polygon(_) => MarkerKind::Polygon,
            Self::Text(_) => MarkerKind::Text,
            Self::Window(_) => MarkerKind::Window,
        }
    }

    fn validate(&self) -> Result<(), GraphError> {
        match self {
            Self::Bitmap(a) => a.validate(),
            Self::Line(a) => a.validate(),
            Self::Polygon(a) => a.validate(),
            Self::Text(a) => a.validate(),
            Self::Window(a) => a.validate(),
        }
    }

    fn same_geometry(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bitmap(a), Self::Bitmap(b)) => a.same_geometry(b),
            (Self::Text(a), Self::Text(b)) => a.same_geometry(b),
            (Self::Window(a), Self::Window(b)) => a.same_geometry(b),
            (Self::Line(_), Self::Line(_)) | (Self::Polygon(_), Self::Polygon(_)) => true,
            _ => false,
        }
    }
}

/// Options shared by every marker kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    /// Data-space coordinates. `f64::INFINITY` and `f64::NEG_INFINITY` pin to
    /// the axis extremes.
    pub coords: Vec<Point2d>,
    pub axes: Axis2d,
    pub anchor: Anchor,
    /// Screen offset applied after mapping, in pixels.
    pub x_offset: f64,
    pub y_offset: f64,
    pub hide: bool,
    pub state: MarkerState,
    /// Draw below the elements instead of above them.
    pub draw_under: bool,
    /// Binding tags. `None` uses the marker's name, class name and `"all"`.
    pub bind_tags: Option<Vec<String>>,
    /// Only draw while the named element exists and is shown.
    pub element: Option<String>,
    pub attrs: MarkerAttrs,
}

impl MarkerOptions {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            coords: Vec::new(),
            axes: Axis2d::default(),
            anchor: Anchor::Center,
            x_offset: 0.0,
            y_offset: 0.0,
            hide: false,
            state: MarkerState::Normal,
            draw_under: false,
            bind_tags: None,
            element: None,
            attrs: MarkerAttrs::defaults(kind),
        }
    }

    /// Set coordinates from a flat `x0 y0 x1 y1 ...` list.
    pub fn set_coords_flat(&mut self, values: &[f64]) -> Result<(), GraphError> {
        if values.len() % 2 != 0 {
            return Err(GraphError::OddCoordinates(values.len()));
        }
        self.coords = values
            .chunks_exact(2)
            .map(|c| Point2d::new(c[0], c[1]))
            .collect();
        Ok(())
    }

    pub fn line_mut(&mut self) -> Option<&mut LineAttrs> {
        match &mut self.attrs {
            MarkerAttrs::Line(a) => Some(a),
            _ => None,
        }
    }

    pub fn polygon_mut(&mut self) -> Option<&mut PolygonAttrs> {
        match &mut self.attrs {
            MarkerAttrs::Polygon(a) => Some(a),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextAttrs> {
        match &mut self.attrs {
            MarkerAttrs::Text(a) => Some(a),
            _ => None,
        }
    }

    pub fn bitmap_mut(&mut self) -> Option<&mut BitmapAttrs> {
        match &mut self.attrs {
            MarkerAttrs::Bitmap(a) => Some(a),
            _ => None,
        }
    }

    pub fn window_mut(&mut self) -> Option<&mut WindowAttrs> {
        match &mut self.attrs {
            MarkerAttrs::Window(a) => Some(a),
            _ => None,
        }
    }

    /// True if switching between the two option sets leaves the screen
    /// geometry unchanged.
    pub(crate) fn same_geometry(&self, other: &Self) -> bool {
        self.coords == other.coords
            && self.axes == other.axes
            && self.anchor == other.anchor
            && self.x_offset == other.x_offset
            && self.y_offset == other.y_offset
            && self.attrs.same_geometry(&other.attrs)
    }
}

/// Cached screen geometry, one variant per kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MarkerGeometry {
    /// Not mapped, or too few coordinates to draw anything.
    #[default]
    Empty,
    Bitmap(BitmapGeometry),
    Line(LineGeometry),
    Polygon(PolygonGeometry),
    Text(TextGeometry),
    Window(WindowGeometry),
}

/// What `map` needs besides the marker itself.
pub(crate) struct MapEnv<'a> {
    pub(crate) ctx: MapContext<'a>,
    pub(crate) measure: &'a TextMeasurer,
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub(crate) id: ShapeId,
    pub(crate) name: String,
    kind: MarkerKind,
    pub(crate) options: MarkerOptions,
    geometry: MarkerGeometry,
    bbox: Option<Region2d>,
    clipped: bool,
    pub(crate) needs_remap: bool,
}

impl Marker {
    pub fn new(name: impl Into<String>, kind: MarkerKind) -> Self {
        Self {
            id: ShapeId::new(),
            name: name.into(),
            kind,
            options: MarkerOptions::new(kind),
            geometry: MarkerGeometry::Empty,
            bbox: None,
            clipped: false,
            needs_remap: true,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn options(&self) -> &MarkerOptions {
        &self.options
    }

    pub fn geometry(&self) -> &MarkerGeometry {
        &self.geometry
    }

    /// Bounding box of the mapped geometry, before clipping.
    pub fn bbox(&self) -> Option<Region2d> {
        self.bbox
    }

    /// True if the mapped geometry lies entirely outside the plot area.
    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    pub fn needs_remap(&self) -> bool {
        self.needs_remap
    }

    /// True if `draw` would paint something.
    pub fn is_drawable(&self) -> bool {
        !self.options.hide && !self.clipped && self.geometry != MarkerGeometry::Empty
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

    /// Validate the options and derive paint state. Coordinates that are not
    /// numbers, or attributes of another kind, are rejected.
    pub(crate) fn configure(&mut self) -> Result<(), GraphError> {
        let found = self.options.attrs.kind();
        if found != self.kind {
            return Err(GraphError::KindMismatch {
                name: self.name.clone(),
                expected: self.kind.as_str(),
                found: found.as_str(),
            });
        }
        if let Some(p) = self.options.coords.iter().find(|p| p.is_nan()) {
            return Err(GraphError::invalid("coords", format!("{} {}", p.x, p.y)));
        }
        for (option, v) in [("xoffset", self.options.x_offset), ("yoffset", self.options.y_offset)] {
            if !v.is_finite() {
                return Err(GraphError::invalid(option, v));
            }
        }
        self.options.attrs.validate()
    }

    /// Recompute the cached screen geometry.
    pub(crate) fn map(&mut self, env: &MapEnv<'_>) {
        self.needs_remap = false;
        let opts = &self.options;
        let plot = env.ctx.plot;
        let offset = Point2d::new(opts.x_offset, opts.y_offset);
        let points: Vec<Point2d> = if opts.coords.len() < self.kind.min_points() {
            Vec::new()
        } else {
            env.ctx
                .map_all(&opts.coords, &opts.axes)
                .into_iter()
                .map(|p| p + offset)
                .collect()
        };

        let mapped = if points.is_empty() {
            None
        } else {
            match &opts.attrs {
                MarkerAttrs::Line(_) => {
                    line::map(points, &plot).map(|(g, b)| (MarkerGeometry::Line(g), b))
                }
                MarkerAttrs::Polygon(_) => {
                    polygon::map(points, &plot).map(|(g, b)| (MarkerGeometry::Polygon(g), b))
                }
                MarkerAttrs::Text(a) => text::map(points[0], a, opts.anchor, env.measure)
                    .map(|(g, b)| (MarkerGeometry::Text(g), b)),
                MarkerAttrs::Bitmap(a) => bitmap::map(&points, a, opts.anchor)
                    .map(|(g, b)| (MarkerGeometry::Bitmap(g), b)),
                MarkerAttrs::Window(a) => window::map(points[0], a, opts.anchor)
                    .map(|(g, b)| (MarkerGeometry::Window(g), b)),
            }
        };

        match mapped {
            Some((geometry, bbox)) => {
                self.clipped = !bbox.intersects(&plot);
                self.geometry = geometry;
                self.bbox = Some(bbox);
            }
            None => {
                self.clipped = false;
                self.geometry = MarkerGeometry::Empty;
                self.bbox = None;
            }
        }
        log::trace!(
            "mapped {} marker \"{}\": bbox {:?} clipped {}",
            self.kind,
            self.name,
            self.bbox,
            self.clipped
        );
    }

    /// Hit test at a screen position. Hidden, disabled and clipped markers
    /// are never hit.
    pub fn point_in(&self, sample: Point2d, halo: f64) -> bool {
        if self.options.hide || self.options.state == MarkerState::Disabled || self.clipped {
            return false;
        }
        match &self.geometry {
            MarkerGeometry::Empty => false,
            MarkerGeometry::Line(g) => line::point_in(g, sample, halo),
            MarkerGeometry::Polygon(g) => polygon::point_in(g, sample),
            MarkerGeometry::Text(g) => text::point_in(g, sample),
            MarkerGeometry::Bitmap(g) => bitmap::point_in(g, sample),
            MarkerGeometry::Window(g) => window::point_in(g, sample),
        }
    }

    /// True if the marker lies inside (`enclosed`) or overlaps `region`.
    pub fn region_in(&self, region: &Region2d, enclosed: bool) -> bool {
        match &self.geometry {
            MarkerGeometry::Empty => false,
            MarkerGeometry::Line(g) => line::region_in(g, region, enclosed),
            MarkerGeometry::Polygon(g) => polygon::region_in(g, region, enclosed),
            MarkerGeometry::Text(g) => text::region_in(g, region, enclosed),
            MarkerGeometry::Bitmap(g) => bitmap::region_in(g, region, enclosed),
            MarkerGeometry::Window(g) => window::region_in(g, region, enclosed),
        }
    }

    pub fn draw(&self, painter: &mut dyn Painter) {
        if !self.is_drawable() {
            return;
        }
        let active = self.options.state == MarkerState::Active;
        match (&self.geometry, &self.options.attrs) {
            (MarkerGeometry::Line(g), MarkerAttrs::Line(a)) => line::draw(g, a, active, painter),
            (MarkerGeometry::Polygon(g), MarkerAttrs::Polygon(a)) => {
                polygon::draw(g, a, active, painter)
            }
            (MarkerGeometry::Text(g), MarkerAttrs::Text(a)) => text::draw(g, a, active, painter),
            (MarkerGeometry::Bitmap(g), MarkerAttrs::Bitmap(a)) => {
                bitmap::draw(g, a, active, painter)
            }
            // Child windows are placed by the host, not painted.
            _ => {}
        }
    }

    pub fn postscript(&self, ps: &mut PsWriter) {
        if !self.is_drawable() {
            return;
        }
        ps.comment(&format!("{} \"{}\"", self.kind.class_name(), self.name));
        if let MarkerGeometry::Window(g) = &self.geometry {
            // The child's contents are not available; leave a placeholder box.
            let color = crate::Color::from_rgb(0.5, 0.5, 0.5);
            ps.draw_rectangle(
                &g.region,
                &crate::pen::Paint::stroke(color, 1.0, &crate::pen::Dashes::Solid),
            );
            return;
        }
        self.draw(ps);
    }

    /// Screen region of a mapped window marker.
    pub(crate) fn window_region(&self) -> Option<Region2d> {
        match &self.geometry {
            MarkerGeometry::Window(g) => Some(g.region),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::*;
    use crate::axis::{Axis, AxisSide};
    use crate::painter::{Font, recording::Recorder};

    fn axes(min: f64, max: f64) -> IndexMap<String, Axis> {
        let mut out = IndexMap::new();
        for (name, side, range) in [("x", AxisSide::Bottom, 200.0), ("y", AxisSide::Left, 200.0)] {
            let mut a = Axis::new(name, side);
            a.options.min = Some(min);
            a.options.max = Some(max);
            a.update_range();
            a.set_screen(0.0, range);
            out.insert(name.to_string(), a);
        }
        out
    }

    fn measure() -> TextMeasurer {
        Arc::new(|_: &str, _: &Font| (20.0, 10.0))
    }

    fn map(marker: &mut Marker, axes: &IndexMap<String, Axis>) {
        let measure = measure();
        let env = MapEnv {
            ctx: MapContext::new(axes, false, Region2d::new(0.0, 0.0, 200.0, 200.0)),
            measure: &measure,
        };
        marker.map(&env);
    }

    #[test]
    fn odd_flat_coordinates_are_rejected() {
        let mut opts = MarkerOptions::new(MarkerKind::Line);
        assert_eq!(
            opts.set_coords_flat(&[1.0, 2.0, 3.0]),
            Err(GraphError::OddCoordinates(3))
        );
        opts.set_coords_flat(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(opts.coords[1], Point2d::new(3.0, 4.0));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut m = Marker::new("m", MarkerKind::Line);
        m.options.attrs = MarkerAttrs::defaults(MarkerKind::Text);
        assert!(matches!(m.configure(), Err(GraphError::KindMismatch { .. })));
    }

    #[test]
    fn line_marker_lifecycle() {
        let mut m = Marker::new("m", MarkerKind::Line);
        m.options.coords = vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 10.0)];
        m.configure().unwrap();
        map(&mut m, &axes(0.0, 20.0));
        let MarkerGeometry::Line(g) = m.geometry() else {
            panic!("expected line geometry");
        };
        assert_eq!(g.points, vec![Point2d::new(0.0, 200.0), Point2d::new(100.0, 100.0)]);
        assert!(!m.is_clipped());

        let first = m.geometry().clone();
        map(&mut m, &axes(0.0, 20.0));
        assert_eq!(&first, m.geometry());

        map(&mut m, &axes(100.0, 200.0));
        assert!(m.is_clipped());
        let MarkerGeometry::Line(g) = m.geometry() else {
            panic!("expected line geometry");
        };
        assert!(g.segments.is_empty());
    }

    #[test]
    fn too_few_points_is_silent() {
        let mut m = Marker::new("p", MarkerKind::Polygon);
        m.options.coords = vec![Point2d::new(1.0, 1.0), Point2d::new(2.0, 2.0)];
        m.configure().unwrap();
        map(&mut m, &axes(0.0, 20.0));
        assert_eq!(m.geometry(), &MarkerGeometry::Empty);
        assert!(!m.is_drawable());
        let mut rec = Recorder::default();
        m.draw(&mut rec);
        assert!(rec.ops.is_empty());
    }

    #[test]
    fn disabled_markers_are_not_hit() {
        let mut m = Marker::new("t", MarkerKind::Text);
        m.options.coords = vec![Point2d::new(10.0, 10.0)];
        if let Some(t) = m.options.text_mut() {
            t.text = "hello".into();
            t.padding = 0.0;
        }
        map(&mut m, &axes(0.0, 20.0));
        assert!(m.point_in(Point2d::new(100.0, 100.0), 0.0));
        m.options.state = MarkerState::Disabled;
        assert!(!m.point_in(Point2d::new(100.0, 100.0), 0.0));
    }

    #[test]
    fn infinite_coordinates_pin_to_plot_edges() {
        let mut m = Marker::new("h", MarkerKind::Line);
        m.options.coords = vec![
            Point2d::new(f64::NEG_INFINITY, 5.0),
            Point2d::new(f64::INFINITY, 5.0),
        ];
        map(&mut m, &axes(0.0, 20.0));
        let MarkerGeometry::Line(g) = m.geometry() else {
            panic!("expected line geometry");
        };
        assert_eq!(g.points[0].x, 0.0);
        assert_eq!(g.points[1].x, 200.0);
    }
}
