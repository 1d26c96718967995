//! Text markers.
use crate::Color;
use crate::error::GraphError;
use crate::geometry::{self, Anchor, Point2d, Region2d};
use crate::painter::{Font, Painter, TextMeasurer, TextStyle};
use crate::pen::Paint;

#[derive(Debug, Clone, PartialEq)]
pub struct TextAttrs {
    pub text: String,
    pub font: Font,
    pub color: Color,
    /// Box drawn behind the text. `None` leaves it transparent.
    pub background: Option<Color>,
    /// Rotation in degrees, counter-clockwise.
    pub angle: f64,
    /// Padding around the text, in pixels.
    pub padding: f64,
    pub active_color: Color,
}

impl Default for TextAttrs {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: Font::default(),
            color: Color::BLACK,
            background: None,
            angle: 0.0,
            padding: 4.0,
            active_color: Color::from_rgb(1.0, 0.0, 0.0),
        }
    }
}

impl TextAttrs {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if !self.angle.is_finite() {
            return Err(GraphError::invalid("rotate", self.angle));
        }
        if self.padding.is_nan() || self.padding < 0.0 {
            return Err(GraphError::invalid("padding", self.padding));
        }
        if self.font.size.is_nan() || self.font.size <= 0.0 {
            return Err(GraphError::invalid("font", self.font.size));
        }
        Ok(())
    }

    pub(crate) fn same_geometry(&self, other: &Self) -> bool {
        self.text == other.text
            && self.font == other.font
            && self.angle == other.angle
            && self.padding == other.padding
    }
}

/// Screen geometry of a mapped text marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextGeometry {
    /// Top-left corner of the axis-aligned box around the rotated text.
    pub anchor: Point2d,
    /// Extent of that box.
    pub width: f64,
    pub height: f64,
    /// Center of the text block.
    pub center: Point2d,
    /// Corners of the rotated text box.
    pub outline: [Point2d; 4],
    /// True unless the rotation is a multiple of 90 degrees.
    pub rotated: bool,
}

impl TextGeometry {
    fn region(&self) -> Region2d {
        Region2d::new(
            self.anchor.x,
            self.anchor.y,
            self.anchor.x + self.width,
            self.anchor.y + self.height,
        )
    }
}

/// Lay out a rotated box of `width` x `height` whose anchor lands on `at`.
pub(super) fn place(
    at: Point2d,
    width: f64,
    height: f64,
    angle: f64,
    anchor: Anchor,
) -> (TextGeometry, Region2d) {
    let rot = geometry::bounding_box(width, height, angle);
    let top_left = geometry::anchor_point(at.x, at.y, rot.width, rot.height, anchor);
    let center = top_left + Point2d::new(rot.width * 0.5, rot.height * 0.5);
    // Screen y grows downward; mirror so positive angles turn counter-clockwise.
    let outline = rot.corners.map(|c| center + Point2d::new(c.x, -c.y));
    let g = TextGeometry {
        anchor: top_left,
        width: rot.width,
        height: rot.height,
        center,
        outline,
        rotated: angle.rem_euclid(90.0) != 0.0,
    };
    let bbox = g.region();
    (g, bbox)
}

pub(super) fn map(
    at: Point2d,
    attrs: &TextAttrs,
    anchor: Anchor,
    measure: &TextMeasurer,
) -> Option<(TextGeometry, Region2d)> {
    if attrs.text.is_empty() || !at.is_finite() {
        return None;
    }
    let (w, h) = measure(&attrs.text, &attrs.font);
    let pad = attrs.padding * 2.0;
    Some(place(at, w + pad, h + pad, attrs.angle, anchor))
}

pub(super) fn point_in(g: &TextGeometry, sample: Point2d) -> bool {
    if g.rotated {
        geometry::point_in_polygon(sample, &g.outline)
    } else {
        g.region().contains(sample)
    }
}

pub(super) fn region_in(g: &TextGeometry, region: &Region2d, enclosed: bool) -> bool {
    if g.rotated {
        geometry::region_in_polygon(region, &g.outline, enclosed)
    } else if enclosed {
        region.encloses(&g.region())
    } else {
        region.intersects(&g.region())
    }
}

pub(super) fn draw(g: &TextGeometry, attrs: &TextAttrs, active: bool, painter: &mut dyn Painter) {
    if let Some(bg) = attrs.background {
        painter.draw_polygon(&g.outline, &Paint::fill(bg));
    }
    let style = TextStyle {
        color: if active { attrs.active_color } else { attrs.color },
        font: attrs.font.clone(),
        angle: attrs.angle,
    };
    painter.draw_text(&attrs.text, g.center, &style);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn fixed_measure() -> TextMeasurer {
        Arc::new(|_: &str, _: &Font| (40.0, 10.0))
    }

    fn attrs(angle: f64) -> TextAttrs {
        TextAttrs {
            text: "label".into(),
            padding: 0.0,
            angle,
            ..TextAttrs::default()
        }
    }

    #[test]
    fn anchored_box() {
        let (g, bbox) = map(
            Point2d::new(100.0, 100.0),
            &attrs(0.0),
            Anchor::NorthWest,
            &fixed_measure(),
        )
        .unwrap();
        assert_eq!(bbox, Region2d::new(100.0, 100.0, 140.0, 110.0));
        assert_eq!(g.center, Point2d::new(120.0, 105.0));
        assert!(point_in(&g, Point2d::new(139.0, 109.0)));
        assert!(!point_in(&g, Point2d::new(141.0, 105.0)));
    }

    #[test]
    fn quarter_turn_swaps_extent() {
        let (g, _) = map(Point2d::ZERO, &attrs(90.0), Anchor::Center, &fixed_measure()).unwrap();
        assert!(!g.rotated);
        assert_eq!((g.width, g.height), (10.0, 40.0));
        assert!(point_in(&g, Point2d::new(0.0, 18.0)));
        assert!(!point_in(&g, Point2d::new(18.0, 0.0)));
    }

    #[test]
    fn rotated_text_tests_against_rotated_outline() {
        let (g, _) = map(Point2d::ZERO, &attrs(45.0), Anchor::Center, &fixed_measure()).unwrap();
        assert!(g.rotated);
        // Inside the axis-aligned box but outside the rotated rectangle.
        let corner = Point2d::new(g.width * 0.5 - 1.0, g.height * 0.5 - 1.0);
        assert!(!point_in(&g, corner));
        assert!(point_in(&g, Point2d::ZERO));
    }

    #[test]
    fn empty_text_maps_to_nothing() {
        let a = TextAttrs::default();
        assert!(map(Point2d::ZERO, &a, Anchor::Center, &fixed_measure()).is_none());
    }
}
