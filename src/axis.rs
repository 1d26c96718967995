//! Axes: limits, scale, screen extent and tick generation.
use std::sync::Arc;

use crate::error::GraphError;
use crate::Color;

/// Axis scaling mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AxisScale {
    /// Linear axis: displayed value is the raw data value.
    #[default]
    Linear,

    /// Logarithmic axis: displayed value is `log_{base}(raw)`.
    ///
    /// Only positive values are representable on this axis.
    Log {
        /// The base of the logarithm.
        base: f64,
    },
}

impl AxisScale {
    /// Base-10 logarithmic scale.
    pub const LOG10: AxisScale = AxisScale::Log { base: 10.0 };

    pub fn is_log(self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Transform raw data value into axis-space value, rejecting values the
    /// scale cannot represent.
    pub(crate) fn data_to_axis(self, value: f64) -> Option<f64> {
        match self {
            Self::Linear => value.is_finite().then_some(value),
            Self::Log { base } => (value.is_finite() && value > 0.0)
                .then(|| value.log(base))
                .filter(|v| v.is_finite()),
        }
    }

    /// Lossy forward transform used while mapping: non-positive values on a
    /// log axis collapse to 0.
    pub(crate) fn forward(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Log { base } if value > 0.0 => value.log(base),
            Self::Log { .. } => 0.0,
        }
    }

    /// Transform axis-space value back into a raw data value.
    pub(crate) fn inverse(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Log { base } => base.powf(value),
        }
    }
}

/// Which edge of the plot area an axis is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Bottom,
    Left,
    Top,
    Right,
}

impl AxisSide {
    /// True for axes that run along the horizontal edges in a non-inverted graph.
    pub fn is_x(self) -> bool {
        matches!(self, Self::Bottom | Self::Top)
    }
}

/// A position along an axis where a tick and label are placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// The value at this tick in data coordinates.
    pub value: f64,
    /// The step between ticks, in axis space.
    pub step_size: f64,
}

/// A tick with an assigned screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedTick {
    /// Screen position along the axis (x for horizontal axes, y for vertical ones).
    pub screen_pos: f64,
    pub tick: Tick,
    pub label: String,
}

/// A function which formats tick values into strings for display on the axis.
pub type TickFormatter = Arc<dyn Fn(Tick) -> String + Send + Sync>;

/// A default formatter that displays values with reasonable precision.
pub fn default_formatter(mark: Tick) -> String {
    let log_step = mark.step_size.log10();
    if log_step >= 0.0 {
        format!("{:.0}", mark.value)
    } else {
        let decimal_places = (-log_step).ceil() as usize;
        format!("{:.*}", decimal_places, mark.value)
    }
}

/// Calculate a "nice" step size based on the desired number of divisions.
/// Returns a value that is a multiple of 1, 2, 5, or 10 times a power of 10.
pub fn nice_step(raw: f64) -> f64 {
    const NICE_STEP_BASES: [f64; 4] = [1.0, 2.0, 5.0, 10.0];
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let exp = raw.log10().floor();
    let base = 10.0_f64.powf(exp);
    for &m in &NICE_STEP_BASES {
        if raw <= m * base {
            return m * base;
        }
    }
    base * 10.0
}

/// User-settable axis options.
#[derive(Clone)]
pub struct AxisOptions {
    /// Explicit lower limit. `None` autoscales from element data.
    pub min: Option<f64>,
    /// Explicit upper limit. `None` autoscales from element data.
    pub max: Option<f64>,
    pub scale: AxisScale,
    /// Flip the axis so values increase towards the origin.
    pub descending: bool,
    pub hide: bool,
    pub title: Option<String>,
    pub color: Color,
    /// Approximate pixels between major ticks.
    pub tick_spacing: f64,
    pub formatter: TickFormatter,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            scale: AxisScale::Linear,
            descending: false,
            hide: false,
            title: None,
            color: Color::BLACK,
            tick_spacing: 80.0,
            formatter: Arc::new(default_formatter),
        }
    }
}

impl std::fmt::Debug for AxisOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxisOptions")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("scale", &self.scale)
            .field("descending", &self.descending)
            .field("hide", &self.hide)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Current limits in axis space (after the log transform, if any).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl AxisRange {
    pub(crate) fn new(min: f64, max: f64) -> Self {
        let range = max - min;
        Self {
            min,
            max,
            range: if range.abs() < f64::EPSILON { 1.0 } else { range },
        }
    }
}

/// An axis of the graph.
///
/// Markers and elements refer to axes by name; the graph owns them.
#[derive(Debug, Clone)]
pub struct Axis {
    pub(crate) name: String,
    pub(crate) side: AxisSide,
    pub options: AxisOptions,
    pub(crate) range: AxisRange,
    pub(crate) screen_min: f64,
    pub(crate) screen_range: f64,
    pub(crate) data_extents: Option<(f64, f64)>,
    pub(crate) ticks: Vec<PositionedTick>,
}

impl Axis {
    pub fn new(name: impl Into<String>, side: AxisSide) -> Self {
        Self {
            name: name.into(),
            side,
            options: AxisOptions::default(),
            range: AxisRange::new(0.0, 1.0),
            screen_min: 0.0,
            screen_range: 1.0,
            data_extents: None,
            ticks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> AxisSide {
        self.side
    }

    pub fn range(&self) -> AxisRange {
        self.range
    }

    /// Data-space limits currently shown on the axis.
    pub fn limits(&self) -> (f64, f64) {
        (
            self.options.scale.inverse(self.range.min),
            self.options.scale.inverse(self.range.max),
        )
    }

    pub fn screen_min(&self) -> f64 {
        self.screen_min
    }

    pub fn screen_range(&self) -> f64 {
        self.screen_range
    }

    pub fn ticks(&self) -> &[PositionedTick] {
        &self.ticks
    }

    /// Check the explicit limits against each other and the scale.
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        let opts = &self.options;
        if let (Some(min), Some(max)) = (opts.min, opts.max)
            && min >= max
        {
            return Err(GraphError::InvalidAxisLimits {
                name: self.name.clone(),
                min,
                max,
            });
        }
        if opts.scale.is_log() {
            for v in [opts.min, opts.max].into_iter().flatten() {
                if v <= 0.0 {
                    return Err(GraphError::invalid("min", v));
                }
            }
            if let AxisScale::Log { base } = opts.scale
                && (base <= 0.0 || base == 1.0 || !base.is_finite())
            {
                return Err(GraphError::invalid("logbase", base));
            }
        }
        if !(opts.tick_spacing.is_finite() && opts.tick_spacing > 0.0) {
            return Err(GraphError::invalid("tickspacing", opts.tick_spacing));
        }
        Ok(())
    }

    /// Record the data extents of every element mapped to this axis.
    pub(crate) fn set_data_extents(&mut self, extents: Option<(f64, f64)>) {
        self.data_extents = extents;
    }

    /// Recompute the axis range from explicit limits and data extents.
    pub(crate) fn update_range(&mut self) {
        let scale = self.options.scale;
        let (default_min, default_max) = if scale.is_log() { (1.0, 10.0) } else { (0.0, 1.0) };
        let (data_min, data_max) = self.data_extents.unwrap_or((default_min, default_max));
        let mut min = self.options.min.unwrap_or(data_min);
        let mut max = self.options.max.unwrap_or(data_max);
        if min > max {
            // Only one limit is explicit and it lies beyond the data.
            match (self.options.min, self.options.max) {
                (Some(_), None) => max = min + (min.abs() * 0.1).max(1.0),
                (None, Some(_)) => min = max - (max.abs() * 0.1).max(1.0),
                _ => std::mem::swap(&mut min, &mut max),
            }
        }
        if min == max {
            if min == 0.0 {
                min = -0.1;
                max = 0.1;
            } else {
                let pad = min.abs() * 0.1;
                min -= pad;
                max += pad;
            }
        }
        if scale.is_log() && min <= 0.0 {
            min = max / 10.0;
        }
        self.range = AxisRange::new(scale.forward(min), scale.forward(max));
        log::trace!("axis {} range {:?}", self.name, self.range);
    }

    pub(crate) fn set_screen(&mut self, screen_min: f64, screen_range: f64) {
        self.screen_min = screen_min;
        self.screen_range = screen_range.max(1.0);
    }

    /// Generate ticks for the current range. `map` turns a data value into a
    /// screen position along the axis.
    pub(crate) fn update_ticks(&mut self, map: impl Fn(&Axis, f64) -> f64) {
        let mut ticks = Vec::new();
        let range = self.range;
        let target = (self.screen_range / self.options.tick_spacing).max(2.0);
        let step = if self.options.scale.is_log() {
            nice_step(range.range / target).max(1.0).round()
        } else {
            nice_step(range.range / target)
        };
        let start = (range.min / step).ceil() * step;
        let mut i = 0;
        loop {
            let axis_value = start + step * i as f64;
            if axis_value > range.max + step * 1e-9 || i > 1000 {
                break;
            }
            let value = self.options.scale.inverse(axis_value);
            let tick = Tick {
                value,
                step_size: if self.options.scale.is_log() { value } else { step },
            };
            ticks.push(PositionedTick {
                screen_pos: map(self, value),
                tick,
                label: (self.options.formatter)(tick),
            });
            i += 1;
        }
        self.ticks = ticks;
    }
}

/// The pair of axes a marker or element maps through, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis2d {
    pub x: String,
    pub y: String,
}

impl Axis2d {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl Default for Axis2d {
    fn default() -> Self {
        Self::new("x", "y")
    }
}
