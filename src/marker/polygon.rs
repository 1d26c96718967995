//! Polygon markers: a closed ring of three or more points.
use crate::Color;
use crate::error::GraphError;
use crate::geometry::{self, Point2d, Region2d, Segment2d};
use crate::painter::Painter;
use crate::pen::{Dashes, Paint};

/// Paint attributes of a polygon marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonAttrs {
    /// `None` draws no outline.
    pub outline: Option<Color>,
    /// `None` leaves the interior transparent.
    pub fill: Option<Color>,
    pub line_width: f64,
    pub dashes: Dashes,
    pub active_outline: Option<Color>,
    pub active_fill: Option<Color>,
}

impl Default for PolygonAttrs {
    fn default() -> Self {
        Self {
            outline: Some(Color::BLACK),
            fill: None,
            line_width: 1.0,
            dashes: Dashes::Solid,
            active_outline: Some(Color::from_rgb(1.0, 0.0, 0.0)),
            active_fill: None,
        }
    }
}

impl PolygonAttrs {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if self.line_width.is_nan() || self.line_width < 0.0 {
            return Err(GraphError::invalid("linewidth", self.line_width));
        }
        self.dashes.validate()
    }
}

/// Screen geometry of a mapped polygon marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonGeometry {
    /// Mapped ring, unclipped and without a closing vertex.
    pub points: Vec<Point2d>,
    /// Interior to fill. Falls back to `points` when clipping degenerates.
    pub fill_points: Vec<Point2d>,
    /// Outline pieces after clipping.
    pub outline: Vec<Segment2d>,
}

pub(super) fn map(points: Vec<Point2d>, plot: &Region2d) -> Option<(PolygonGeometry, Region2d)> {
    if points.len() < 3 {
        return None;
    }
    let bbox = Region2d::bounding(&points)?;
    let mut fill_points = geometry::poly_rect_clip(plot, &points);
    if fill_points.len() < 3 {
        fill_points = points.clone();
    }
    let mut ring = points.clone();
    ring.push(points[0]);
    let outline = geometry::clip_polyline(plot, &ring);
    Some((
        PolygonGeometry {
            points,
            fill_points,
            outline,
        },
        bbox,
    ))
}

pub(super) fn point_in(g: &PolygonGeometry, sample: Point2d) -> bool {
    geometry::point_in_polygon(sample, &g.points)
}

pub(super) fn region_in(g: &PolygonGeometry, region: &Region2d, enclosed: bool) -> bool {
    geometry::region_in_polygon(region, &g.points, enclosed)
}

pub(super) fn draw(
    g: &PolygonGeometry,
    attrs: &PolygonAttrs,
    active: bool,
    painter: &mut dyn Painter,
) {
    let (fill, outline) = if active {
        (
            attrs.active_fill.or(attrs.fill),
            attrs.active_outline.or(attrs.outline),
        )
    } else {
        (attrs.fill, attrs.outline)
    };
    if let Some(fill) = fill {
        painter.draw_polygon(&g.fill_points, &Paint::fill(fill));
    }
    if let Some(color) = outline
        && attrs.line_width > 0.0
    {
        painter.draw_segments(
            &g.outline,
            &Paint::stroke(color, attrs.line_width, &attrs.dashes),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot() -> Region2d {
        Region2d::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn straddling_polygon_fill_is_clipped() {
        let pts = vec![
            Point2d::new(50.0, 50.0),
            Point2d::new(150.0, 50.0),
            Point2d::new(50.0, 90.0),
        ];
        let (g, bbox) = map(pts, &plot()).unwrap();
        assert!(g.fill_points.iter().all(|p| p.x <= 100.0));
        assert!((3..=6).contains(&g.fill_points.len()));
        assert_eq!(bbox.right, 150.0);
    }

    #[test]
    fn degenerate_clip_falls_back_to_unclipped_ring() {
        // Touches the plot only at a corner.
        let pts = vec![
            Point2d::new(100.0, 100.0),
            Point2d::new(150.0, 100.0),
            Point2d::new(150.0, 150.0),
        ];
        let (g, _) = map(pts.clone(), &plot()).unwrap();
        assert_eq!(g.fill_points, pts);
    }

    #[test]
    fn hit_tests_use_the_ring() {
        let pts = vec![
            Point2d::new(10.0, 10.0),
            Point2d::new(40.0, 10.0),
            Point2d::new(40.0, 40.0),
            Point2d::new(10.0, 40.0),
        ];
        let (g, _) = map(pts, &plot()).unwrap();
        assert!(point_in(&g, Point2d::new(20.0, 20.0)));
        assert!(point_in(&g, Point2d::new(10.0, 10.0)));
        assert!(!point_in(&g, Point2d::new(50.0, 20.0)));
        assert!(region_in(&g, &Region2d::new(0.0, 0.0, 50.0, 50.0), true));
        assert!(region_in(&g, &Region2d::new(20.0, 20.0, 25.0, 25.0), false));
        assert!(!region_in(&g, &Region2d::new(20.0, 20.0, 25.0, 25.0), true));
        assert_eq!(g.outline.len(), 4);
    }
}
