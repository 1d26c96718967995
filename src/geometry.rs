//! Geometric primitives and the clipping/hit-testing kernel.
//!
//! Everything here is stateless. Points are either data-space or screen-space
//! depending on who holds them; the type does not say which.
use core::fmt;
use core::str::FromStr;

use glam::DVec2;

use crate::error::GraphError;

/// A 2D point. Screen or data space, decided by context.
pub type Point2d = DVec2;

/// Distance under which a sample is considered to lie on a polygon edge.
const EDGE_EPSILON: f64 = 1e-9;

/// An axis-aligned rectangle with inclusive bounds.
///
/// Callers keep `right >= left` and `bottom >= top`; use [`Region2d::from_corners`]
/// when the ordering of the two corners is not known.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region2d {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Region2d {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a region from two opposite corners given in any order.
    pub fn from_corners(a: Point2d, b: Point2d) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Smallest region holding every finite point, or `None` if there are none.
    pub fn bounding(points: &[Point2d]) -> Option<Self> {
        let mut finite = points.iter().filter(|p| p.is_finite());
        let first = *finite.next()?;
        let mut out = Self::from_corners(first, first);
        for p in finite {
            out.left = out.left.min(p.x);
            out.right = out.right.max(p.x);
            out.top = out.top.min(p.y);
            out.bottom = out.bottom.max(p.y);
        }
        Some(out)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Corners in clockwise screen order starting at the top-left.
    pub fn corners(&self) -> [Point2d; 4] {
        [
            Point2d::new(self.left, self.top),
            Point2d::new(self.right, self.top),
            Point2d::new(self.right, self.bottom),
            Point2d::new(self.left, self.bottom),
        ]
    }

    pub fn contains(&self, p: Point2d) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// True if `other` lies entirely within this region.
    pub fn encloses(&self, other: &Region2d) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    pub fn intersects(&self, other: &Region2d) -> bool {
        !(other.right < self.left
            || other.left > self.right
            || other.bottom < self.top
            || other.top > self.bottom)
    }

    /// Overlap of the two regions, if any.
    pub fn intersection(&self, other: &Region2d) -> Option<Region2d> {
        self.intersects(other).then(|| Region2d {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        })
    }
}

/// A single line segment. Clipping a polyline yields a list of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2d {
    pub p: Point2d,
    pub q: Point2d,
}

impl Segment2d {
    pub fn new(p: Point2d, q: Point2d) -> Self {
        Self { p, q }
    }
}

/// The nine standard anchor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    NorthWest,
    North,
    NorthEast,
    West,
    #[default]
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl FromStr for Anchor {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "nw" => Self::NorthWest,
            "n" => Self::North,
            "ne" => Self::NorthEast,
            "w" => Self::West,
            "center" => Self::Center,
            "e" => Self::East,
            "sw" => Self::SouthWest,
            "s" => Self::South,
            "se" => Self::SouthEast,
            _ => {
                return Err(GraphError::InvalidValue {
                    option: "anchor",
                    value: s.to_string(),
                });
            }
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NorthWest => "nw",
            Self::North => "n",
            Self::NorthEast => "ne",
            Self::West => "w",
            Self::Center => "center",
            Self::East => "e",
            Self::SouthWest => "sw",
            Self::South => "s",
            Self::SouthEast => "se",
        };
        f.write_str(s)
    }
}

/// Translate an anchor-relative reference point into the top-left corner of a
/// `width` x `height` box.
pub fn anchor_point(x: f64, y: f64, width: f64, height: f64, anchor: Anchor) -> Point2d {
    let (dx, dy) = match anchor {
        Anchor::NorthWest => (0.0, 0.0),
        Anchor::West => (0.0, height * 0.5),
        Anchor::SouthWest => (0.0, height),
        Anchor::North => (width * 0.5, 0.0),
        Anchor::Center => (width * 0.5, height * 0.5),
        Anchor::South => (width * 0.5, height),
        Anchor::NorthEast => (width, 0.0),
        Anchor::East => (width, height * 0.5),
        Anchor::SouthEast => (width, height),
    };
    Point2d::new(x - dx, y - dy)
}

/// Result of rotating a rectangle about its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedBox {
    /// Width of the axis-aligned box enclosing the rotated rectangle.
    pub width: f64,
    /// Height of the axis-aligned box enclosing the rotated rectangle.
    pub height: f64,
    /// Rotated corners, relative to the rectangle's center.
    pub corners: [Point2d; 4],
}

/// Rotated bounding box of a `width` x `height` rectangle turned by
/// `angle_degrees` about its center. The angle is taken mod 360.
pub fn bounding_box(width: f64, height: f64, angle_degrees: f64) -> RotatedBox {
    let angle = angle_degrees.rem_euclid(360.0);
    // Quarter turns are exact so that unrotated text keeps integral extents.
    let (sin, cos) = if angle == 0.0 {
        (0.0, 1.0)
    } else if angle == 90.0 {
        (1.0, 0.0)
    } else if angle == 180.0 {
        (0.0, -1.0)
    } else if angle == 270.0 {
        (-1.0, 0.0)
    } else {
        angle.to_radians().sin_cos()
    };

    let hw = width * 0.5;
    let hh = height * 0.5;
    let corners = [
        Point2d::new(-hw, -hh),
        Point2d::new(hw, -hh),
        Point2d::new(hw, hh),
        Point2d::new(-hw, hh),
    ]
    .map(|c| Point2d::new(c.x * cos - c.y * sin, c.x * sin + c.y * cos));

    let (mut x_max, mut y_max) = (0.0_f64, 0.0_f64);
    for c in &corners {
        x_max = x_max.max(c.x.abs());
        y_max = y_max.max(c.y.abs());
    }
    RotatedBox {
        width: x_max * 2.0,
        height: y_max * 2.0,
        corners,
    }
}

/// Crossing-number (even-odd) point-in-polygon test.
///
/// The boundary is inclusive: a sample lying on an edge or vertex is inside.
/// Polygons with fewer than three vertices contain nothing. A repeated closing
/// vertex is accepted.
pub fn point_in_polygon(sample: Point2d, polygon: &[Point2d]) -> bool {
    let polygon = open_ring(polygon);
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[j], polygon[i]);
        if segment_distance(sample, &Segment2d::new(a, b)) <= EDGE_EPSILON {
            return true;
        }
        if (b.y > sample.y) != (a.y > sample.y) {
            let x_cross = (a.x - b.x) * (sample.y - b.y) / (a.y - b.y) + b.x;
            if sample.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn open_ring(polygon: &[Point2d]) -> &[Point2d] {
    match polygon {
        [first, .., last] if polygon.len() > 3 && first == last => &polygon[..polygon.len() - 1],
        _ => polygon,
    }
}

fn clip_test(ds: f64, dr: f64, t1: &mut f64, t2: &mut f64) -> bool {
    if ds < 0.0 {
        let t = dr / ds;
        if t > *t2 {
            return false;
        }
        if t > *t1 {
            *t1 = t;
        }
    } else if ds > 0.0 {
        let t = dr / ds;
        if t < *t1 {
            return false;
        }
        if t < *t2 {
            *t2 = t;
        }
    } else if dr < 0.0 {
        return false;
    }
    true
}

/// Clip the segment `p`-`q` against `rect` (Liang-Barsky).
///
/// Returns `None` if nothing of the segment lies inside, otherwise the clipped
/// endpoints (unchanged if the segment was already inside).
pub fn line_rect_clip(rect: &Region2d, p: Point2d, q: Point2d) -> Option<(Point2d, Point2d)> {
    let d = q - p;
    let (mut t1, mut t2) = (0.0, 1.0);
    let visible = clip_test(-d.x, p.x - rect.left, &mut t1, &mut t2)
        && clip_test(d.x, rect.right - p.x, &mut t1, &mut t2)
        && clip_test(-d.y, p.y - rect.top, &mut t1, &mut t2)
        && clip_test(d.y, rect.bottom - p.y, &mut t1, &mut t2);
    if !visible {
        return None;
    }
    let q2 = if t2 < 1.0 { p + d * t2 } else { q };
    let p2 = if t1 > 0.0 { p + d * t1 } else { p };
    Some((p2, q2))
}

/// Clip a polyline against `rect`, producing the visible pieces as segments.
/// Non-finite vertices break the line.
pub fn clip_polyline(rect: &Region2d, points: &[Point2d]) -> Vec<Segment2d> {
    points
        .windows(2)
        .filter(|w| w[0].is_finite() && w[1].is_finite())
        .filter_map(|w| line_rect_clip(rect, w[0], w[1]))
        .map(|(p, q)| Segment2d::new(p, q))
        .collect()
}

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Edge {
    fn inside(self, p: Point2d) -> bool {
        match self {
            Edge::Left(x) => p.x >= x,
            Edge::Right(x) => p.x <= x,
            Edge::Top(y) => p.y >= y,
            Edge::Bottom(y) => p.y <= y,
        }
    }

    fn intersect(self, a: Point2d, b: Point2d) -> Point2d {
        match self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                Point2d::new(x, a.y + t * (b.y - a.y))
            }
            Edge::Top(y) | Edge::Bottom(y) => {
                let t = (y - a.y) / (b.y - a.y);
                Point2d::new(a.x + t * (b.x - a.x), y)
            }
        }
    }
}

/// Clip a polygon against `rect` (Sutherland-Hodgman).
///
/// Returns the clipped ring without a repeated closing vertex. A result with
/// fewer than three vertices is degenerate; callers then draw the unclipped
/// polygon instead.
pub fn poly_rect_clip(rect: &Region2d, polygon: &[Point2d]) -> Vec<Point2d> {
    let mut ring: Vec<Point2d> = open_ring(polygon).to_vec();
    if ring.len() < 3 {
        return Vec::new();
    }
    let edges = [
        Edge::Left(rect.left),
        Edge::Right(rect.right),
        Edge::Top(rect.top),
        Edge::Bottom(rect.bottom),
    ];
    for edge in edges {
        if ring.is_empty() {
            break;
        }
        let input = std::mem::take(&mut ring);
        let n = input.len();
        for i in 0..n {
            let prev = input[(i + n - 1) % n];
            let cur = input[i];
            match (edge.inside(prev), edge.inside(cur)) {
                (true, true) => ring.push(cur),
                (true, false) => ring.push(edge.intersect(prev, cur)),
                (false, true) => {
                    ring.push(edge.intersect(prev, cur));
                    ring.push(cur);
                }
                (false, false) => {}
            }
        }
    }
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Closest point to `sample` on the segment.
pub fn project_onto_segment(sample: Point2d, seg: &Segment2d) -> Point2d {
    let d = seg.q - seg.p;
    let len2 = d.length_squared();
    if len2 == 0.0 {
        return seg.p;
    }
    let t = ((sample - seg.p).dot(d) / len2).clamp(0.0, 1.0);
    seg.p + d * t
}

pub fn segment_distance(sample: Point2d, seg: &Segment2d) -> f64 {
    sample.distance(project_onto_segment(sample, seg))
}

/// True if `sample` is within `halo` pixels of any segment.
pub fn point_in_segments(sample: Point2d, segments: &[Segment2d], halo: f64) -> bool {
    segments
        .iter()
        .any(|seg| segment_distance(sample, seg) <= halo)
}

/// Region test against a closed polygon.
///
/// With `enclosed` every vertex must lie inside the region; otherwise any
/// overlap between the polygon and the region counts.
pub fn region_in_polygon(region: &Region2d, polygon: &[Point2d], enclosed: bool) -> bool {
    let ring = open_ring(polygon);
    if ring.is_empty() {
        return false;
    }
    if enclosed {
        return ring.iter().all(|p| region.contains(*p));
    }
    let n = ring.len();
    let edge_hit = (0..n).any(|i| line_rect_clip(region, ring[i], ring[(i + 1) % n]).is_some());
    edge_hit || point_in_polygon(region.center(), ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point2d {
        Point2d::new(x, y)
    }

    fn unit_rect() -> Region2d {
        Region2d::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn polygon_vertices_are_inside() {
        let square = [pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 4.0), pt(0.0, 4.0)];
        for v in square {
            assert!(point_in_polygon(v, &square), "vertex {v:?}");
        }
        assert!(point_in_polygon(pt(2.0, 0.0), &square));
        assert!(point_in_polygon(pt(2.0, 2.0), &square));
        assert!(!point_in_polygon(pt(5.0, 2.0), &square));
        assert!(!point_in_polygon(pt(-0.1, 2.0), &square));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = [pt(0.0, 0.0), pt(4.0, 4.0)];
        assert!(!point_in_polygon(pt(0.0, 0.0), &line));
        assert!(!point_in_polygon(pt(1.0, 1.0), &[]));
    }

    #[test]
    fn concave_polygon_uses_even_odd() {
        // A "U" shape; the notch is outside.
        let u = [
            pt(0.0, 0.0),
            pt(3.0, 0.0),
            pt(3.0, 2.0),
            pt(2.0, 2.0),
            pt(2.0, 1.0),
            pt(1.0, 1.0),
            pt(1.0, 2.0),
            pt(0.0, 2.0),
        ];
        assert!(point_in_polygon(pt(0.5, 1.5), &u));
        assert!(!point_in_polygon(pt(1.5, 1.5), &u));
        assert!(point_in_polygon(pt(1.5, 0.5), &u));
    }

    #[test]
    fn line_clip_inside_is_unchanged() {
        let (p, q) = line_rect_clip(&unit_rect(), pt(1.0, 1.0), pt(9.0, 8.0)).unwrap();
        assert_eq!(p, pt(1.0, 1.0));
        assert_eq!(q, pt(9.0, 8.0));
    }

    #[test]
    fn line_clip_crossing_and_outside() {
        let (p, q) = line_rect_clip(&unit_rect(), pt(-5.0, 5.0), pt(15.0, 5.0)).unwrap();
        assert_eq!(p, pt(0.0, 5.0));
        assert_eq!(q, pt(10.0, 5.0));

        assert!(line_rect_clip(&unit_rect(), pt(-5.0, -5.0), pt(-1.0, 20.0)).is_none());
        assert!(line_rect_clip(&unit_rect(), pt(11.0, 0.0), pt(11.0, 10.0)).is_none());
    }

    #[test]
    fn polyline_clip_disconnects() {
        let pts = [pt(1.0, 1.0), pt(19.0, 1.0), pt(19.0, 5.0), pt(1.0, 5.0)];
        let segs = clip_polyline(&unit_rect(), &pts);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].q, pt(10.0, 1.0));
        assert_eq!(segs[1].p, pt(10.0, 5.0));
    }

    #[test]
    fn poly_clip_outside_and_straddling() {
        let outside = [pt(20.0, 20.0), pt(30.0, 20.0), pt(25.0, 30.0)];
        assert_eq!(poly_rect_clip(&unit_rect(), &outside).len(), 0);

        let straddle = [pt(5.0, 2.0), pt(15.0, 5.0), pt(5.0, 8.0)];
        let clipped = poly_rect_clip(&unit_rect(), &straddle);
        assert!((3..=6).contains(&clipped.len()), "{clipped:?}");
        assert!(clipped.iter().all(|p| unit_rect().contains(*p)));

        let inside = [pt(1.0, 1.0), pt(2.0, 1.0), pt(1.0, 2.0)];
        assert_eq!(poly_rect_clip(&unit_rect(), &inside), inside.to_vec());
    }

    #[test]
    fn poly_clip_enclosing_polygon_yields_rect() {
        let big = [pt(-5.0, -5.0), pt(15.0, -5.0), pt(15.0, 15.0), pt(-5.0, 15.0)];
        let clipped = poly_rect_clip(&unit_rect(), &big);
        assert_eq!(clipped.len(), 4);
        for c in unit_rect().corners() {
            assert!(clipped.contains(&c));
        }
    }

    #[test]
    fn bounding_box_quarter_turns_are_exact() {
        let b = bounding_box(40.0, 10.0, 90.0);
        assert_eq!((b.width, b.height), (10.0, 40.0));
        let b = bounding_box(40.0, 10.0, -180.0);
        assert_eq!((b.width, b.height), (40.0, 10.0));
        let b = bounding_box(40.0, 10.0, 450.0);
        assert_eq!((b.width, b.height), (10.0, 40.0));
    }

    #[test]
    fn bounding_box_diagonal() {
        let b = bounding_box(10.0, 10.0, 45.0);
        let diag = 10.0 * 2.0_f64.sqrt();
        assert!((b.width - diag).abs() < 1e-9);
        assert!((b.height - diag).abs() < 1e-9);
    }

    #[test]
    fn anchor_translation() {
        assert_eq!(anchor_point(10.0, 10.0, 4.0, 2.0, Anchor::NorthWest), pt(10.0, 10.0));
        assert_eq!(anchor_point(10.0, 10.0, 4.0, 2.0, Anchor::Center), pt(8.0, 9.0));
        assert_eq!(anchor_point(10.0, 10.0, 4.0, 2.0, Anchor::SouthEast), pt(6.0, 8.0));
        assert_eq!(anchor_point(10.0, 10.0, 4.0, 2.0, Anchor::East), pt(6.0, 9.0));
        assert_eq!("sw".parse::<Anchor>().unwrap(), Anchor::SouthWest);
        assert!("middle".parse::<Anchor>().is_err());
    }

    #[test]
    fn region_queries() {
        let tri = [pt(0.0, 0.0), pt(10.0, 0.0), pt(0.0, 10.0)];
        assert!(region_in_polygon(&Region2d::new(-1.0, -1.0, 11.0, 11.0), &tri, true));
        assert!(!region_in_polygon(&Region2d::new(1.0, 1.0, 11.0, 11.0), &tri, true));
        // Region strictly inside the triangle overlaps without touching edges.
        assert!(region_in_polygon(&Region2d::new(1.0, 1.0, 2.0, 2.0), &tri, false));
        assert!(!region_in_polygon(&Region2d::new(8.0, 8.0, 9.0, 9.0), &tri, false));
    }

    #[test]
    fn segment_hit_with_halo() {
        let segs = [Segment2d::new(pt(0.0, 0.0), pt(10.0, 0.0))];
        assert!(point_in_segments(pt(5.0, 2.0), &segs, 2.0));
        assert!(!point_in_segments(pt(5.0, 2.5), &segs, 2.0));
        assert!(!point_in_segments(pt(13.0, 0.0), &segs, 2.0));
    }
}
