//! Bitmap markers.
//!
//! A bitmap is drawn at its natural size at the first coordinate, or stretched
//! to fill the box between the first two coordinates.
use crate::Color;
use crate::error::GraphError;
use crate::geometry::{self, Anchor, Point2d, Region2d};
use crate::painter::{Bitmap, BitmapStyle, Painter};

use super::text::{self, TextGeometry};

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapAttrs {
    pub bitmap: Option<Bitmap>,
    pub foreground: Option<Color>,
    /// `None` makes clear pixels transparent.
    pub background: Option<Color>,
    /// Rotation in degrees, counter-clockwise.
    pub angle: f64,
    pub active_foreground: Option<Color>,
}

impl Default for BitmapAttrs {
    fn default() -> Self {
        Self {
            bitmap: None,
            foreground: Some(Color::BLACK),
            background: None,
            angle: 0.0,
            active_foreground: None,
        }
    }
}

impl BitmapAttrs {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if self.foreground.is_none() && self.background.is_none() {
            return Err(GraphError::invalid("foreground", "both colors are unset"));
        }
        if !self.angle.is_finite() {
            return Err(GraphError::invalid("rotate", self.angle));
        }
        Ok(())
    }

    pub(crate) fn same_geometry(&self, other: &Self) -> bool {
        let size = |b: &Option<Bitmap>| b.as_ref().map(|b| (b.width(), b.height()));
        size(&self.bitmap) == size(&other.bitmap) && self.angle == other.angle
    }

    /// Paint resource for drawing: an opaque bitmap fills clear pixels with the
    /// background, a transparent one draws through a mask.
    fn style(&self, active: bool) -> BitmapStyle {
        let fg = if active {
            self.active_foreground.or(self.foreground)
        } else {
            self.foreground
        };
        match fg {
            Some(foreground) => BitmapStyle {
                foreground,
                background: self.background,
                angle: self.angle,
            },
            // Background only: the box is filled and set pixels are not painted.
            None => BitmapStyle {
                foreground: Color::TRANSPARENT,
                background: self.background,
                angle: self.angle,
            },
        }
    }
}

/// Screen geometry of a mapped bitmap marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BitmapGeometry {
    pub placed: TextGeometry,
    /// Unrotated destination box, centered on the placed box.
    pub dest: Region2d,
}

pub(super) fn map(
    points: &[Point2d],
    attrs: &BitmapAttrs,
    anchor: Anchor,
) -> Option<(BitmapGeometry, Region2d)> {
    let bitmap = attrs.bitmap.as_ref()?;
    let first = *points.first()?;
    if !first.is_finite() {
        return None;
    }
    let (at, width, height, anchor) = match points.get(1) {
        Some(second) if second.is_finite() => {
            let r = Region2d::from_corners(first, *second);
            (Point2d::new(r.left, r.top), r.width(), r.height(), Anchor::NorthWest)
        }
        _ => (first, bitmap.width() as f64, bitmap.height() as f64, anchor),
    };
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let (placed, bbox) = text::place(at, width, height, attrs.angle, anchor);
    let dest = Region2d::new(
        placed.center.x - width * 0.5,
        placed.center.y - height * 0.5,
        placed.center.x + width * 0.5,
        placed.center.y + height * 0.5,
    );
    Some((BitmapGeometry { placed, dest }, bbox))
}

pub(super) fn point_in(g: &BitmapGeometry, sample: Point2d) -> bool {
    if g.placed.rotated {
        geometry::point_in_polygon(sample, &g.placed.outline)
    } else {
        Region2d::bounding(&g.placed.outline).is_some_and(|r| r.contains(sample))
    }
}

pub(super) fn region_in(g: &BitmapGeometry, region: &Region2d, enclosed: bool) -> bool {
    geometry::region_in_polygon(region, &g.placed.outline, enclosed)
}

pub(super) fn draw(g: &BitmapGeometry, attrs: &BitmapAttrs, active: bool, painter: &mut dyn Painter) {
    if let Some(bitmap) = &attrs.bitmap {
        painter.draw_bitmap(bitmap, &g.dest, &attrs.style(active));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> BitmapAttrs {
        BitmapAttrs {
            bitmap: Some(Bitmap::from_rows(&["####", "#..#", "####"])),
            ..BitmapAttrs::default()
        }
    }

    #[test]
    fn both_colors_unset_is_an_error() {
        let mut a = attrs();
        a.foreground = None;
        assert!(a.validate().is_err());
        a.background = Some(Color::WHITE);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn natural_size_at_anchor() {
        let (g, bbox) = map(&[Point2d::new(10.0, 10.0)], &attrs(), Anchor::NorthWest).unwrap();
        assert_eq!(bbox, Region2d::new(10.0, 10.0, 14.0, 13.0));
        assert_eq!(g.dest, bbox);
        assert!(point_in(&g, Point2d::new(12.0, 12.0)));
    }

    #[test]
    fn two_points_stretch() {
        let (g, _) = map(
            &[Point2d::new(50.0, 40.0), Point2d::new(10.0, 0.0)],
            &attrs(),
            Anchor::Center,
        )
        .unwrap();
        assert_eq!(g.dest, Region2d::new(10.0, 0.0, 50.0, 40.0));
    }

    #[test]
    fn no_bitmap_no_geometry() {
        assert!(map(&[Point2d::ZERO], &BitmapAttrs::default(), Anchor::Center).is_none());
    }
}
