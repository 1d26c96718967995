//! [`Painter`] on an `iced` canvas frame.
use iced::widget::canvas::{self, Frame, LineDash, Path, Stroke};
use iced::{Point, Radians, Size, Vector};

use crate::Color;
use crate::geometry::{Point2d, Region2d, Segment2d};
use crate::painter::{Bitmap, BitmapStyle, Painter, TextStyle};
use crate::pen::Paint;

fn point(p: Point2d) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

fn stroke_with<'a>(color: Color, paint: &Paint, dashes: &'a [f32]) -> Stroke<'a> {
    let mut stroke = Stroke::default()
        .with_color(color)
        .with_width(paint.width.max(1.0) as f32);
    if !dashes.is_empty() {
        stroke.line_dash = LineDash {
            segments: dashes,
            offset: 0,
        };
    }
    stroke
}

impl Painter for Frame {
    fn draw_segments(&mut self, segments: &[Segment2d], paint: &Paint) {
        let Some(color) = paint.stroke else {
            return;
        };
        if segments.is_empty() {
            return;
        }
        let path = Path::new(|b| {
            for s in segments {
                b.move_to(point(s.p));
                b.line_to(point(s.q));
            }
        });
        let dashes = paint.dashes.clone().unwrap_or_default();
        self.stroke(&path, stroke_with(color, paint, &dashes));
    }

    fn draw_polygon(&mut self, points: &[Point2d], paint: &Paint) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let path = Path::new(|b| {
            b.move_to(point(*first));
            for p in rest {
                b.line_to(point(*p));
            }
            b.close();
        });
        if let Some(fill) = paint.fill {
            self.fill(&path, fill);
        }
        if let Some(color) = paint.stroke {
            let dashes = paint.dashes.clone().unwrap_or_default();
            self.stroke(&path, stroke_with(color, paint, &dashes));
        }
    }

    fn draw_text(&mut self, text: &str, center: Point2d, style: &TextStyle) {
        let content = text.to_string();
        let size = style.font.size as f32;
        let color = style.color;
        let angle = style.angle;
        self.with_save(|frame| {
            frame.translate(Vector::new(center.x as f32, center.y as f32));
            if angle != 0.0 {
                frame.rotate(Radians(-(angle.to_radians() as f32)));
            }
            frame.fill_text(canvas::Text {
                content,
                position: Point::ORIGIN,
                color,
                size: size.into(),
                align_x: iced::Alignment::Center.into(),
                align_y: iced::Alignment::Center.into(),
                ..Default::default()
            });
        });
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: &Region2d, style: &BitmapStyle) {
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return;
        }
        let sx = (dest.width() / bitmap.width() as f64) as f32;
        let sy = (dest.height() / bitmap.height() as f64) as f32;
        let center = dest.center();
        let half = Vector::new(dest.width() as f32 * 0.5, dest.height() as f32 * 0.5);
        self.with_save(|frame| {
            frame.translate(Vector::new(center.x as f32, center.y as f32));
            if style.angle != 0.0 {
                frame.rotate(Radians(-(style.angle.to_radians() as f32)));
            }
            if let Some(bg) = style.background {
                frame.fill_rectangle(Point::ORIGIN - half, Size::new(half.x * 2.0, half.y * 2.0), bg);
            }
            for y in 0..bitmap.height() {
                for x in 0..bitmap.width() {
                    if bitmap.get(x, y) {
                        let top_left =
                            Point::new(x as f32 * sx, y as f32 * sy) - half;
                        frame.fill_rectangle(top_left, Size::new(sx, sy), style.foreground);
                    }
                }
            }
        });
    }
}
