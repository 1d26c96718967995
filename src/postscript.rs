//! Encapsulated PostScript output.
//!
//! [`PsWriter`] accumulates a page in memory. Screen coordinates are flipped
//! on output so the page looks like the screen.
use std::fmt::{self, Write as _};

use crate::Color;
use crate::geometry::{Point2d, Region2d, Segment2d};
use crate::painter::{Bitmap, BitmapStyle, Font, Painter, TextStyle};
use crate::pen::Paint;

const PROLOG: &str = "\
/M { moveto } bind def
/L { lineto } bind def
/CT { % (text) -> centered at current point
  dup stringwidth pop 2 div neg 0 rmoveto show
} bind def
";

/// Text PostScript emitter.
#[derive(Debug, Clone)]
pub struct PsWriter {
    out: String,
    width: f64,
    height: f64,
    foreground: Option<Color>,
    background: Color,
    font: Option<Font>,
}

fn escape(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                s.push('\\');
                s.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => s.push(c),
            _ => s.push('?'),
        }
    }
    s
}

impl PsWriter {
    /// Start a page of the given size in pixels (one pixel per point).
    pub fn new(width: f64, height: f64) -> Self {
        let mut ps = Self {
            out: String::new(),
            width,
            height,
            foreground: None,
            background: Color::WHITE,
            font: None,
        };
        ps.emit(format_args!("%!PS-Adobe-3.0 EPSF-3.0"));
        ps.emit(format_args!(
            "%%BoundingBox: 0 0 {} {}",
            width.ceil() as i64,
            height.ceil() as i64
        ));
        ps.emit(format_args!("%%Creator: blt_graph"));
        ps.emit(format_args!("%%EndComments"));
        ps.out.push_str(PROLOG);
        ps
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        // Writing into a String cannot fail.
        let _ = self.out.write_fmt(args);
        self.out.push('\n');
    }

    fn x(&self, x: f64) -> f64 {
        x
    }

    fn y(&self, y: f64) -> f64 {
        self.height - y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Emit a `%` comment line.
    pub fn comment(&mut self, text: &str) {
        for line in text.lines() {
            self.emit(format_args!("% {line}"));
        }
    }

    pub fn set_foreground(&mut self, color: Color) {
        if self.foreground == Some(color) {
            return;
        }
        self.foreground = Some(color);
        self.emit(format_args!(
            "{:.3} {:.3} {:.3} setrgbcolor",
            color.r, color.g, color.b
        ));
    }

    /// Background used for the page and opaque bitmaps.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn background(&self) -> Color {
        self.background
    }

    fn set_line(&mut self, paint: &Paint) {
        self.emit(format_args!("{:.2} setlinewidth", paint.width.max(0.0)));
        match &paint.dashes {
            Some(d) if !d.is_empty() => {
                let list: Vec<String> = d.iter().map(|v| format!("{v}")).collect();
                self.emit(format_args!("[{}] 0 setdash", list.join(" ")));
            }
            _ => self.emit(format_args!("[] 0 setdash")),
        }
    }

    fn set_font(&mut self, font: &Font) {
        if self.font.as_ref() == Some(font) {
            return;
        }
        self.emit(format_args!(
            "/{} findfont {:.1} scalefont setfont",
            font.family.replace(' ', "-"),
            font.size
        ));
        self.font = Some(font.clone());
    }

    fn path(&mut self, points: &[Point2d]) {
        for (i, p) in points.iter().enumerate() {
            let op = if i == 0 { "M" } else { "L" };
            let (x, y) = (self.x(p.x), self.y(p.y));
            self.emit(format_args!("{x:.2} {y:.2} {op}"));
        }
    }

    /// Fill a closed polygon with the foreground color.
    pub fn fill_polygon(&mut self, points: &[Point2d]) {
        if points.len() < 3 {
            return;
        }
        self.emit(format_args!("newpath"));
        self.path(points);
        self.emit(format_args!("closepath fill"));
    }

    /// Fill the whole page with the background color.
    pub fn fill_background(&mut self) {
        let bg = self.background;
        self.set_foreground(bg);
        let page = Region2d::new(0.0, 0.0, self.width, self.height);
        self.fill_polygon(&page.corners());
    }

    /// Stroke disjoint segments with the current line settings.
    pub fn stroke_segments(&mut self, segments: &[Segment2d]) {
        if segments.is_empty() {
            return;
        }
        self.emit(format_args!("newpath"));
        for s in segments {
            let (px, py, qx, qy) = (self.x(s.p.x), self.y(s.p.y), self.x(s.q.x), self.y(s.q.y));
            self.emit(format_args!("{px:.2} {py:.2} M {qx:.2} {qy:.2} L"));
        }
        self.emit(format_args!("stroke"));
    }

    /// Finish the page and return the document.
    pub fn finish(mut self) -> String {
        self.emit(format_args!("showpage"));
        self.emit(format_args!("%%EOF"));
        self.out
    }

    /// Document produced so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }
}

impl Painter for PsWriter {
    fn draw_segments(&mut self, segments: &[Segment2d], paint: &Paint) {
        let Some(color) = paint.stroke else {
            return;
        };
        self.set_foreground(color);
        self.set_line(paint);
        self.stroke_segments(segments);
    }

    fn draw_polygon(&mut self, points: &[Point2d], paint: &Paint) {
        if let Some(fill) = paint.fill {
            self.set_foreground(fill);
            self.fill_polygon(points);
        }
        if let Some(color) = paint.stroke
            && points.len() >= 2
        {
            self.set_foreground(color);
            self.set_line(paint);
            self.emit(format_args!("newpath"));
            self.path(points);
            self.emit(format_args!("closepath stroke"));
        }
    }

    fn draw_text(&mut self, text: &str, center: Point2d, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        self.set_foreground(style.color);
        self.set_font(&style.font);
        let lines: Vec<&str> = text.lines().collect();
        let line_height = style.font.size * 1.2;
        let top = (lines.len() as f64 - 1.0) * line_height * 0.5;
        let (cx, cy) = (self.x(center.x), self.y(center.y));
        self.emit(format_args!("gsave {cx:.2} {cy:.2} translate"));
        if style.angle != 0.0 {
            self.emit(format_args!("{:.2} rotate", style.angle));
        }
        for (i, line) in lines.iter().enumerate() {
            // Baseline sits about a third of the font size below the line center.
            let y = top - i as f64 * line_height - style.font.size * 0.35;
            self.emit(format_args!("0 {y:.2} M ({}) CT", escape(line)));
        }
        self.emit(format_args!("grestore"));
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: &Region2d, style: &BitmapStyle) {
        let (w, h) = (bitmap.width(), bitmap.height());
        if w == 0 || h == 0 {
            return;
        }
        let center = dest.center();
        let (cx, cy) = (self.x(center.x), self.y(center.y));
        self.emit(format_args!("gsave {cx:.2} {cy:.2} translate"));
        if style.angle != 0.0 {
            self.emit(format_args!("{:.2} rotate", style.angle));
        }
        let (dw, dh) = (dest.width(), dest.height());
        self.emit(format_args!("{:.2} {:.2} translate", -dw * 0.5, -dh * 0.5));
        if let Some(bg) = style.background {
            self.set_foreground(bg);
            self.emit(format_args!("0 0 {dw:.2} {dh:.2} rectfill"));
        }
        self.set_foreground(style.foreground);
        self.emit(format_args!("{dw:.2} {dh:.2} scale"));
        let hex: String = bitmap
            .bits()
            .iter()
            .map(|b| format!("{:02x}", b.reverse_bits()))
            .collect();
        self.emit(format_args!(
            "{w} {h} true [{w} 0 0 -{h} 0 {h}] {{<{hex}>}} imagemask"
        ));
        self.emit(format_args!("grestore"));
        // imagemask changed the color inside gsave; the cached one is stale.
        self.foreground = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_frame() {
        let ps = PsWriter::new(200.0, 100.0).finish();
        assert!(ps.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n%%BoundingBox: 0 0 200 100\n"));
        assert!(ps.ends_with("showpage\n%%EOF\n"));
    }

    #[test]
    fn y_is_flipped() {
        let mut ps = PsWriter::new(100.0, 100.0);
        ps.set_foreground(Color::BLACK);
        ps.stroke_segments(&[Segment2d::new(Point2d::new(0.0, 0.0), Point2d::new(10.0, 30.0))]);
        assert!(ps.as_str().contains("0.00 100.00 M 10.00 70.00 L"));
    }

    #[test]
    fn foreground_is_not_repeated() {
        let mut ps = PsWriter::new(10.0, 10.0);
        ps.set_foreground(Color::BLACK);
        ps.set_foreground(Color::BLACK);
        assert_eq!(ps.as_str().matches("setrgbcolor").count(), 1);
    }

    #[test]
    fn text_is_escaped() {
        let mut ps = PsWriter::new(10.0, 10.0);
        ps.draw_text("a(b)\\", Point2d::new(5.0, 5.0), &TextStyle::default());
        assert!(ps.as_str().contains("(a\\(b\\)\\\\) CT"));
        assert!(ps.as_str().contains("/Helvetica findfont"));
    }

    #[test]
    fn degenerate_polygon_is_skipped() {
        let mut ps = PsWriter::new(10.0, 10.0);
        let before = ps.as_str().len();
        ps.fill_polygon(&[Point2d::ZERO, Point2d::ONE]);
        assert_eq!(ps.as_str().len(), before);
    }
}
