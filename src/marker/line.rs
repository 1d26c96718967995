//! Line markers: an open polyline through two or more points.
use crate::Color;
use crate::error::GraphError;
use crate::geometry::{self, Point2d, Region2d, Segment2d};
use crate::painter::Painter;
use crate::pen::{Dashes, Paint};

/// Paint attributes of a line marker.
#[derive(Debug, Clone, PartialEq)]
pub struct LineAttrs {
    pub color: Color,
    /// Color drawn in the gaps of a dashed line. `None` leaves them empty.
    pub fill: Option<Color>,
    pub line_width: f64,
    pub dashes: Dashes,
    pub active_color: Color,
}

impl Default for LineAttrs {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            fill: None,
            line_width: 1.0,
            dashes: Dashes::Solid,
            active_color: Color::from_rgb(1.0, 0.0, 0.0),
        }
    }
}

impl LineAttrs {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if self.line_width.is_nan() || self.line_width < 0.0 {
            return Err(GraphError::invalid("linewidth", self.line_width));
        }
        self.dashes.validate()
    }
}

/// Screen geometry of a mapped line marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineGeometry {
    /// Mapped vertices, unclipped.
    pub points: Vec<Point2d>,
    /// Visible pieces after clipping to the plot area.
    pub segments: Vec<Segment2d>,
}

pub(super) fn map(points: Vec<Point2d>, plot: &Region2d) -> Option<(LineGeometry, Region2d)> {
    if points.len() < 2 {
        return None;
    }
    let bbox = Region2d::bounding(&points)?;
    let segments = geometry::clip_polyline(plot, &points);
    Some((LineGeometry { points, segments }, bbox))
}

pub(super) fn point_in(g: &LineGeometry, sample: Point2d, halo: f64) -> bool {
    geometry::point_in_segments(sample, &g.segments, halo)
}

pub(super) fn region_in(g: &LineGeometry, region: &Region2d, enclosed: bool) -> bool {
    if enclosed {
        return g.points.iter().all(|p| region.contains(*p));
    }
    g.points
        .windows(2)
        .any(|w| geometry::line_rect_clip(region, w[0], w[1]).is_some())
}

pub(super) fn draw(g: &LineGeometry, attrs: &LineAttrs, active: bool, painter: &mut dyn Painter) {
    if g.segments.is_empty() {
        return;
    }
    if let Some(fill) = attrs.fill
        && attrs.dashes != Dashes::Solid
    {
        painter.draw_segments(
            &g.segments,
            &Paint::stroke(fill, attrs.line_width, &Dashes::Solid),
        );
    }
    let color = if active { attrs.active_color } else { attrs.color };
    painter.draw_segments(
        &g.segments,
        &Paint::stroke(color, attrs.line_width, &attrs.dashes),
    );
}
