//! Draw targets.
//!
//! Markers, elements and the legend render through the [`Painter`] trait, so
//! the same geometry can go to an `iced` canvas frame (with the `canvas`
//! feature) or to the PostScript writer.
use std::sync::Arc;

use crate::Color;
use crate::geometry::{Point2d, Region2d, Segment2d};
use crate::pen::{Paint, Symbol};

/// Font used for text markers, axis labels and legend entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    /// Size in pixels.
    pub size: f64,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            size: 12.0,
        }
    }
}

/// Attributes of a text draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub font: Font,
    /// Rotation in degrees, counter-clockwise.
    pub angle: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font: Font::default(),
            angle: 0.0,
        }
    }
}

/// Measures a (possibly multi-line) string, returning `(width, height)` in pixels.
pub type TextMeasurer = Arc<dyn Fn(&str, &Font) -> (f64, f64) + Send + Sync>;

/// Fixed-pitch estimate used when the host supplies no measurer.
pub fn default_measure(text: &str, font: &Font) -> (f64, f64) {
    let lines = text.lines().count().max(1);
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        0.6 * font.size * widest as f64,
        1.2 * font.size * lines as f64,
    )
}

/// A one bit deep image, rows packed least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Bitmap {
    fn stride(width: u32) -> usize {
        width.div_ceil(8) as usize
    }

    /// Build from packed rows. Returns `None` if `bits` is too short.
    pub fn from_bits(width: u32, height: u32, bits: Vec<u8>) -> Option<Self> {
        (bits.len() >= Self::stride(width) * height as usize).then_some(Self {
            width,
            height,
            bits,
        })
    }

    /// Build from rows of `'#'` (set) and anything else (clear).
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let stride = Self::stride(width);
        let mut bits = vec![0u8; stride * rows.len()];
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    bits[y * stride + x / 8] |= 1 << (x % 8);
                }
            }
        }
        Self {
            width,
            height: rows.len() as u32,
            bits,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.bits[y as usize * Self::stride(self.width) + x as usize / 8];
        byte & (1 << (x % 8)) != 0
    }

    /// Packed rows, for writers that emit raw image data.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }
}

/// How a bitmap is painted.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapStyle {
    pub foreground: Color,
    /// `None` leaves clear pixels transparent.
    pub background: Option<Color>,
    /// Rotation in degrees.
    pub angle: f64,
}

/// A draw target.
pub trait Painter {
    /// Stroke a set of disjoint segments.
    fn draw_segments(&mut self, segments: &[Segment2d], paint: &Paint);

    /// Fill and/or outline a closed polygon.
    fn draw_polygon(&mut self, points: &[Point2d], paint: &Paint);

    /// Draw text centered on `center`, rotated about it.
    fn draw_text(&mut self, text: &str, center: Point2d, style: &TextStyle);

    /// Draw a bitmap scaled into `dest` (the unrotated destination box).
    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: &Region2d, style: &BitmapStyle);

    fn draw_polyline(&mut self, points: &[Point2d], paint: &Paint) {
        let segments: Vec<Segment2d> = points
            .windows(2)
            .map(|w| Segment2d::new(w[0], w[1]))
            .collect();
        self.draw_segments(&segments, paint);
    }

    fn draw_rectangle(&mut self, rect: &Region2d, paint: &Paint) {
        self.draw_polygon(&rect.corners(), paint);
    }

    fn draw_circle(&mut self, center: Point2d, radius: f64, paint: &Paint) {
        const SIDES: usize = 24;
        let points: Vec<Point2d> = (0..SIDES)
            .map(|i| {
                let t = i as f64 * std::f64::consts::TAU / SIDES as f64;
                center + Point2d::new(t.cos(), t.sin()) * radius
            })
            .collect();
        self.draw_polygon(&points, paint);
    }

    /// Draw a data point symbol of the given size centered on `center`.
    fn draw_symbol(&mut self, symbol: Symbol, center: Point2d, size: f64, paint: &Paint) {
        let r = size * 0.5;
        match symbol {
            Symbol::None => {}
            Symbol::Circle => self.draw_circle(center, r, paint),
            Symbol::Square => self.draw_rectangle(
                &Region2d::new(center.x - r, center.y - r, center.x + r, center.y + r),
                paint,
            ),
            Symbol::Diamond => self.draw_polygon(
                &[
                    center + Point2d::new(0.0, -r),
                    center + Point2d::new(r, 0.0),
                    center + Point2d::new(0.0, r),
                    center + Point2d::new(-r, 0.0),
                ],
                paint,
            ),
            Symbol::Triangle => {
                let h = r * 3f64.sqrt() * 0.5;
                self.draw_polygon(
                    &[
                        center + Point2d::new(0.0, -r),
                        center + Point2d::new(h, r * 0.5),
                        center + Point2d::new(-h, r * 0.5),
                    ],
                    paint,
                );
            }
            Symbol::Plus | Symbol::Cross => {
                let (a, b) = if symbol == Symbol::Plus {
                    (Point2d::new(r, 0.0), Point2d::new(0.0, r))
                } else {
                    let d = r * std::f64::consts::FRAC_1_SQRT_2;
                    (Point2d::new(d, d), Point2d::new(d, -d))
                };
                let stroke = Paint {
                    stroke: paint.stroke.or(paint.fill),
                    fill: None,
                    width: paint.width,
                    dashes: None,
                };
                self.draw_segments(
                    &[
                        Segment2d::new(center - a, center + a),
                        Segment2d::new(center - b, center + b),
                    ],
                    &stroke,
                );
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::recording::{Op, Recorder};
    use super::*;

    #[test]
    fn bitmap_rows() {
        let bm = Bitmap::from_rows(&["#.#", ".#.", "#########"]);
        assert_eq!((bm.width(), bm.height()), (9, 3));
        assert!(bm.get(0, 0) && !bm.get(1, 0) && bm.get(2, 0));
        assert!(bm.get(8, 2));
        assert!(!bm.get(9, 2));
        assert!(Bitmap::from_bits(16, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn measure_multiline() {
        let font = Font {
            family: "x".into(),
            size: 10.0,
        };
        let (w, h) = default_measure("ab\nabcd", &font);
        assert!((w - 24.0).abs() < 1e-9);
        assert!((h - 24.0).abs() < 1e-9);
    }

    #[test]
    fn symbols_go_through_primitives() {
        let mut rec = Recorder::default();
        let paint = Paint::fill(Color::BLACK);
        rec.draw_symbol(Symbol::Square, Point2d::new(10.0, 10.0), 4.0, &paint);
        rec.draw_symbol(Symbol::Plus, Point2d::new(0.0, 0.0), 4.0, &paint);
        rec.draw_symbol(Symbol::None, Point2d::new(0.0, 0.0), 4.0, &paint);
        assert_eq!(rec.ops.len(), 2);
        assert_eq!(
            rec.ops[0],
            Op::Polygon(Region2d::new(8.0, 8.0, 12.0, 12.0).corners().to_vec())
        );
        assert!(matches!(&rec.ops[1], Op::Segments(s) if s.len() == 2));
    }
}
