//! Coordinate mapping between data space and screen space.
//!
//! Data values pass through the axis scale, are normalized against the axis
//! range, optionally flipped for descending axes and then scaled into the
//! axis' screen extent. Vertical mapping additionally inverts, since screen y
//! grows downward.
//!
//! `f64::INFINITY` and `f64::NEG_INFINITY` are elastic bounds: they normalize
//! to 1 and 0, landing on the axis' maximum and minimum respectively.
use indexmap::IndexMap;

use crate::axis::{Axis, Axis2d};
use crate::geometry::{Point2d, Region2d};

fn normalize(axis: &Axis, value: f64) -> f64 {
    let norm = if value == f64::INFINITY {
        1.0
    } else if value == f64::NEG_INFINITY {
        0.0
    } else {
        let v = axis.options.scale.forward(value);
        (v - axis.range.min) / axis.range.range
    };
    if axis.options.descending {
        1.0 - norm
    } else {
        norm
    }
}

/// Map a data value onto a horizontally laid out axis.
pub fn hmap(axis: &Axis, value: f64) -> f64 {
    normalize(axis, value) * axis.screen_range + axis.screen_min
}

/// Map a data value onto a vertically laid out axis.
pub fn vmap(axis: &Axis, value: f64) -> f64 {
    (1.0 - normalize(axis, value)) * axis.screen_range + axis.screen_min
}

fn denormalize(axis: &Axis, norm: f64) -> f64 {
    let norm = if axis.options.descending {
        1.0 - norm
    } else {
        norm
    };
    axis.options
        .scale
        .inverse(norm * axis.range.range + axis.range.min)
}

/// Inverse of [`hmap`].
pub fn inv_hmap(axis: &Axis, screen: f64) -> f64 {
    denormalize(axis, (screen - axis.screen_min) / axis.screen_range)
}

/// Inverse of [`vmap`].
pub fn inv_vmap(axis: &Axis, screen: f64) -> f64 {
    denormalize(axis, 1.0 - (screen - axis.screen_min) / axis.screen_range)
}

/// Borrowed pair of axes resolved from an [`Axis2d`].
#[derive(Debug, Clone, Copy)]
pub struct AxisPair<'a> {
    pub x: &'a Axis,
    pub y: &'a Axis,
}

/// Map a data point to screen space. With `inverted`, the x axis runs
/// vertically and the y axis horizontally.
pub fn map_point(point: Point2d, axes: AxisPair<'_>, inverted: bool) -> Point2d {
    if inverted {
        Point2d::new(hmap(axes.y, point.y), vmap(axes.x, point.x))
    } else {
        Point2d::new(hmap(axes.x, point.x), vmap(axes.y, point.y))
    }
}

/// Map a screen point back to data space.
pub fn inv_map_point(screen: Point2d, axes: AxisPair<'_>, inverted: bool) -> Point2d {
    if inverted {
        Point2d::new(inv_vmap(axes.x, screen.y), inv_hmap(axes.y, screen.x))
    } else {
        Point2d::new(inv_hmap(axes.x, screen.x), inv_vmap(axes.y, screen.y))
    }
}

/// Everything a marker or element needs to compute its screen geometry.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub axes: &'a IndexMap<String, Axis>,
    pub inverted: bool,
    /// The plot area in screen space.
    pub plot: Region2d,
}

impl<'a> MapContext<'a> {
    pub fn new(axes: &'a IndexMap<String, Axis>, inverted: bool, plot: Region2d) -> Self {
        Self {
            axes,
            inverted,
            plot,
        }
    }

    /// Resolve an axis pair by name. `None` if either axis has gone away.
    pub fn pair(&self, axes: &Axis2d) -> Option<AxisPair<'a>> {
        Some(AxisPair {
            x: self.axes.get(&axes.x)?,
            y: self.axes.get(&axes.y)?,
        })
    }

    pub fn map(&self, point: Point2d, axes: &Axis2d) -> Option<Point2d> {
        Some(map_point(point, self.pair(axes)?, self.inverted))
    }

    pub fn map_all(&self, points: &[Point2d], axes: &Axis2d) -> Vec<Point2d> {
        match self.pair(axes) {
            Some(pair) => points
                .iter()
                .map(|p| map_point(*p, pair, self.inverted))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn invert(&self, screen: Point2d, axes: &Axis2d) -> Option<Point2d> {
        Some(inv_map_point(screen, self.pair(axes)?, self.inverted))
    }
}
