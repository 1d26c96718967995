//! Line elements: a trace through the data points plus point symbols.
use crate::geometry::{self, Point2d, Region2d, Segment2d};
use crate::painter::Painter;
use crate::pen::PenOptions;
use crate::transform::MapContext;

use super::{ElementGeometry, ElementOptions, MappedPoint, Nearest, StyledSegment};

/// Line-specific options.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceAttrs {
    /// Connect consecutive points.
    pub trace: bool,
}

impl Default for TraceAttrs {
    fn default() -> Self {
        Self { trace: true }
    }
}

pub(super) fn map(
    opts: &ElementOptions,
    attrs: &TraceAttrs,
    slots: &[usize],
    ctx: &MapContext<'_>,
) -> ElementGeometry {
    let mut g = ElementGeometry::default();
    for (index, &slot) in slots.iter().enumerate() {
        let (x, y) = (opts.x[index], opts.y[index]);
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let Some(screen) = ctx.map(Point2d::new(x, y), &opts.axes) else {
            return ElementGeometry::default();
        };
        g.points.push(MappedPoint {
            index,
            screen,
            slot,
        });
    }
    if attrs.trace {
        for w in g.points.windows(2) {
            // A skipped point breaks the trace.
            if w[1].index != w[0].index + 1 {
                continue;
            }
            if let Some((p, q)) = geometry::line_rect_clip(&ctx.plot, w[0].screen, w[1].screen) {
                g.traces.push(StyledSegment {
                    segment: Segment2d::new(p, q),
                    slot: w[0].slot,
                });
            }
        }
    }
    g
}

/// Unclipped trace pieces between consecutive mapped points.
fn pieces(g: &ElementGeometry) -> impl Iterator<Item = (&MappedPoint, &MappedPoint)> {
    g.points
        .windows(2)
        .filter(|w| w[1].index == w[0].index + 1)
        .map(|w| (&w[0], &w[1]))
}

pub(super) fn closest(
    g: &ElementGeometry,
    opts: &ElementOptions,
    sample: Point2d,
    interpolate: bool,
    ctx: &MapContext<'_>,
) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    let mut consider = |candidate: Nearest| {
        if best.as_ref().is_none_or(|b| candidate.distance < b.distance) {
            best = Some(candidate);
        }
    };
    for p in &g.points {
        consider(Nearest {
            index: p.index,
            distance: sample.distance(p.screen),
            screen: p.screen,
            point: Point2d::new(opts.x[p.index], opts.y[p.index]),
        });
    }
    if interpolate {
        for (a, b) in pieces(g) {
            let seg = Segment2d::new(a.screen, b.screen);
            let screen = geometry::project_onto_segment(sample, &seg);
            let Some(point) = ctx.invert(screen, &opts.axes) else {
                continue;
            };
            consider(Nearest {
                index: a.index,
                distance: sample.distance(screen),
                screen,
                point,
            });
        }
    }
    best
}

pub(super) fn region_in(g: &ElementGeometry, region: &Region2d, enclosed: bool) -> bool {
    if g.points.is_empty() {
        return false;
    }
    if enclosed {
        return g.points.iter().all(|p| region.contains(p.screen));
    }
    g.points.iter().any(|p| region.contains(p.screen))
        || pieces(g).any(|(a, b)| geometry::line_rect_clip(region, a.screen, b.screen).is_some())
}

pub(super) fn draw_slot(
    g: &ElementGeometry,
    slot: usize,
    pen: &PenOptions,
    plot: &Region2d,
    painter: &mut dyn Painter,
) {
    let segments: Vec<Segment2d> = g
        .traces
        .iter()
        .filter(|s| s.slot == slot)
        .map(|s| s.segment)
        .collect();
    if !segments.is_empty() && pen.line_width > 0.0 {
        painter.draw_segments(&segments, &pen.trace_paint());
    }
    let paint = pen.symbol_paint();
    for p in g.points.iter().filter(|p| p.slot == slot) {
        if plot.contains(p.screen) {
            painter.draw_symbol(pen.symbol, p.screen, pen.symbol_size, &paint);
        }
    }
}

pub(super) fn draw_points(
    points: &[&MappedPoint],
    pen: &PenOptions,
    plot: &Region2d,
    painter: &mut dyn Painter,
) {
    let paint = pen.symbol_paint();
    for p in points {
        if plot.contains(p.screen) {
            painter.draw_symbol(pen.symbol, p.screen, pen.symbol_size, &paint);
        }
    }
}

pub(super) fn draw_legend_symbol(
    pen: &PenOptions,
    center: Point2d,
    size: f64,
    painter: &mut dyn Painter,
) {
    let half = Point2d::new(size, 0.0);
    if pen.line_width > 0.0 {
        painter.draw_segments(
            &[Segment2d::new(center - half, center + half)],
            &pen.trace_paint(),
        );
    }
    painter.draw_symbol(pen.symbol, center, pen.symbol_size.min(size), &pen.symbol_paint());
}
