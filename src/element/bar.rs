//! Bar elements: one rectangle per data point, from a baseline to the value.
//!
//! Bars are laid out in data space and mapped corner to corner, so an
//! inverted graph produces horizontal bars without special casing.
use crate::error::GraphError;
use crate::geometry::{Point2d, Region2d};
use crate::painter::Painter;
use crate::pen::PenOptions;
use crate::transform::MapContext;

use super::{ElementGeometry, ElementOptions, MappedBar, MappedPoint, Nearest};

#[derive(Debug, Clone, PartialEq)]
pub struct BarAttrs {
    /// Bar width in x-axis data units.
    pub bar_width: f64,
    /// Value the bars grow from.
    pub base: f64,
}

impl Default for BarAttrs {
    fn default() -> Self {
        Self {
            bar_width: 0.9,
            base: 0.0,
        }
    }
}

impl BarAttrs {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if !(self.bar_width.is_finite() && self.bar_width > 0.0) {
            return Err(GraphError::invalid("barwidth", self.bar_width));
        }
        if !self.base.is_finite() {
            return Err(GraphError::invalid("baseline", self.base));
        }
        Ok(())
    }
}

/// Baseline usable on the element's y axis: a log axis cannot show a
/// non-positive base, so bars start from its lower limit instead.
fn effective_base(attrs: &BarAttrs, opts: &ElementOptions, ctx: &MapContext<'_>) -> f64 {
    match ctx.axes.get(&opts.axes.y) {
        Some(axis) if axis.options.scale.is_log() && attrs.base <= 0.0 => axis.limits().0,
        _ => attrs.base,
    }
}

pub(super) fn map(
    opts: &ElementOptions,
    attrs: &BarAttrs,
    slots: &[usize],
    ctx: &MapContext<'_>,
) -> ElementGeometry {
    let mut g = ElementGeometry::default();
    let half = attrs.bar_width * 0.5;
    let base = effective_base(attrs, opts, ctx);
    for (index, &slot) in slots.iter().enumerate() {
        let (x, y) = (opts.x[index], opts.y[index]);
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let (Some(a), Some(b), Some(top)) = (
            ctx.map(Point2d::new(x - half, base), &opts.axes),
            ctx.map(Point2d::new(x + half, y), &opts.axes),
            ctx.map(Point2d::new(x, y), &opts.axes),
        ) else {
            return ElementGeometry::default();
        };
        g.points.push(MappedPoint {
            index,
            screen: top,
            slot,
        });
        if let Some(rect) = Region2d::from_corners(a, b).intersection(&ctx.plot) {
            g.bars.push(MappedBar { index, rect, slot });
        }
    }
    g
}

fn rect_distance(rect: &Region2d, p: Point2d) -> f64 {
    let dx = (rect.left - p.x).max(0.0).max(p.x - rect.right);
    let dy = (rect.top - p.y).max(0.0).max(p.y - rect.bottom);
    dx.hypot(dy)
}

pub(super) fn closest(g: &ElementGeometry, opts: &ElementOptions, sample: Point2d) -> Option<Nearest> {
    g.bars
        .iter()
        .map(|bar| {
            let screen = g
                .points
                .iter()
                .find(|p| p.index == bar.index)
                .map_or(bar.rect.center(), |p| p.screen);
            Nearest {
                index: bar.index,
                distance: rect_distance(&bar.rect, sample),
                screen,
                point: Point2d::new(opts.x[bar.index], opts.y[bar.index]),
            }
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

pub(super) fn region_in(g: &ElementGeometry, region: &Region2d, enclosed: bool) -> bool {
    if g.bars.is_empty() {
        return false;
    }
    if enclosed {
        g.bars.iter().all(|b| region.encloses(&b.rect))
    } else {
        g.bars.iter().any(|b| region.intersects(&b.rect))
    }
}

pub(super) fn draw_bars<'a>(
    bars: impl Iterator<Item = &'a MappedBar>,
    pen: &PenOptions,
    painter: &mut dyn Painter,
) {
    let paint = pen.bar_paint();
    for bar in bars {
        painter.draw_rectangle(&bar.rect, &paint);
    }
}

pub(super) fn draw_legend_symbol(
    pen: &PenOptions,
    center: Point2d,
    size: f64,
    painter: &mut dyn Painter,
) {
    let r = size * 0.5;
    painter.draw_rectangle(
        &Region2d::new(center.x - r, center.y - r, center.x + r, center.y + r),
        &pen.bar_paint(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_rect() {
        let r = Region2d::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(rect_distance(&r, Point2d::new(5.0, 5.0)), 0.0);
        assert_eq!(rect_distance(&r, Point2d::new(13.0, 14.0)), 5.0);
        assert_eq!(rect_distance(&r, Point2d::new(-2.0, 5.0)), 2.0);
    }

    #[test]
    fn bar_width_must_be_positive() {
        let mut attrs = BarAttrs::default();
        assert!(attrs.validate().is_ok());
        attrs.bar_width = 0.0;
        assert!(attrs.validate().is_err());
    }
}
