//! Pens: named bundles of paint attributes.
use crate::Color;
use crate::error::GraphError;

/// Dash pattern used when stroking lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dashes {
    /// Solid continuous line.
    #[default]
    Solid,
    /// Dotted line with configurable spacing.
    Dotted { spacing: f32 },
    /// Dashed line with configurable dash length.
    Dashed { length: f32 },
    /// Alternating on/off lengths in pixels.
    Pattern(Vec<u8>),
}

impl Dashes {
    /// Parse a whitespace separated dash list such as `"5 2"`. An empty string
    /// means solid.
    pub fn parse(list: &str) -> Result<Self, GraphError> {
        let mut values = Vec::new();
        for word in list.split_whitespace() {
            let v: u8 = word
                .parse()
                .map_err(|_| GraphError::InvalidDashes(format!("\"{word}\" is not 1..255")))?;
            values.push(v);
        }
        if values.is_empty() {
            return Ok(Self::Solid);
        }
        let dashes = Self::Pattern(values);
        dashes.validate()?;
        Ok(dashes)
    }

    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        match self {
            Self::Solid => Ok(()),
            Self::Dotted { spacing } if *spacing > 0.0 => Ok(()),
            Self::Dashed { length } if *length > 0.0 => Ok(()),
            Self::Pattern(values) if !values.is_empty() && values.iter().all(|v| *v > 0) => {
                Ok(())
            }
            other => Err(GraphError::InvalidDashes(format!("{other:?}"))),
        }
    }

    /// On/off segment lengths, or `None` for a solid line.
    pub fn segments(&self) -> Option<Vec<f32>> {
        match self {
            Self::Solid => None,
            Self::Dotted { spacing } => Some(vec![1.0, *spacing]),
            Self::Dashed { length } => Some(vec![*length, *length]),
            Self::Pattern(values) => Some(values.iter().map(|v| *v as f32).collect()),
        }
    }
}

/// Symbols drawn at the data points of line elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Symbol {
    None,
    Square,
    #[default]
    Circle,
    Diamond,
    Plus,
    Cross,
    Triangle,
}

/// Paint attributes of a pen.
#[derive(Debug, Clone, PartialEq)]
pub struct PenOptions {
    /// Color of traces and symbol outlines.
    pub color: Color,
    /// Interior color of bars and symbols. `None` leaves them hollow.
    pub fill: Option<Color>,
    /// Border color of bars. `None` draws no border.
    pub outline: Option<Color>,
    pub line_width: f64,
    pub dashes: Dashes,
    pub symbol: Symbol,
    /// Symbol size in pixels.
    pub symbol_size: f64,
}

impl Default for PenOptions {
    fn default() -> Self {
        Self {
            color: Color::from_rgb(0.0, 0.0, 1.0),
            fill: Some(Color::from_rgb(0.0, 0.0, 1.0)),
            outline: None,
            line_width: 1.0,
            dashes: Dashes::Solid,
            symbol: Symbol::Circle,
            symbol_size: 6.0,
        }
    }
}

impl PenOptions {
    /// Defaults used for the active pen of an element.
    pub fn active() -> Self {
        Self {
            color: Color::from_rgb(1.0, 0.0, 1.0),
            fill: Some(Color::from_rgb(1.0, 0.75, 0.8)),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if self.line_width.is_nan() || self.line_width < 0.0 {
            return Err(GraphError::invalid("linewidth", self.line_width));
        }
        if self.symbol_size.is_nan() || self.symbol_size < 0.0 {
            return Err(GraphError::invalid("pixels", self.symbol_size));
        }
        self.dashes.validate()
    }

    pub(crate) fn trace_paint(&self) -> Paint {
        Paint::stroke(self.color, self.line_width, &self.dashes)
    }

    pub(crate) fn symbol_paint(&self) -> Paint {
        Paint {
            stroke: Some(self.color),
            fill: self.fill,
            width: self.line_width.max(1.0),
            dashes: None,
        }
    }

    pub(crate) fn bar_paint(&self) -> Paint {
        Paint {
            stroke: self.outline,
            fill: self.fill.or(Some(self.color)),
            width: self.line_width,
            dashes: None,
        }
    }
}

/// A named pen shared between elements and style palettes.
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub(crate) name: String,
    pub options: PenOptions,
}

impl Pen {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: PenOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Paint attributes resolved into a form a [`Painter`](crate::painter::Painter)
/// can use directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paint {
    pub stroke: Option<Color>,
    pub fill: Option<Color>,
    pub width: f64,
    pub dashes: Option<Vec<f32>>,
}

impl Paint {
    pub fn stroke(color: Color, width: f64, dashes: &Dashes) -> Self {
        Self {
            stroke: Some(color),
            fill: None,
            width,
            dashes: dashes.segments(),
        }
    }

    pub fn fill(color: Color) -> Self {
        Self {
            stroke: None,
            fill: Some(color),
            width: 0.0,
            dashes: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.stroke.is_some() || self.fill.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_lists() {
        assert_eq!(Dashes::parse("").unwrap(), Dashes::Solid);
        assert_eq!(Dashes::parse("5 2").unwrap(), Dashes::Pattern(vec![5, 2]));
        assert!(Dashes::parse("5 0").is_err());
        assert!(Dashes::parse("300").is_err());
        assert!(Dashes::parse("a").is_err());
        assert_eq!(
            Dashes::Dashed { length: 4.0 }.segments(),
            Some(vec![4.0, 4.0])
        );
    }

    #[test]
    fn pen_validation() {
        let mut opts = PenOptions::default();
        assert!(opts.validate().is_ok());
        opts.line_width = -1.0;
        assert!(opts.validate().is_err());
        opts.line_width = f64::NAN;
        assert!(opts.validate().is_err());
    }
}
