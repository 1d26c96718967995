//! Errors reported by the configuration layer.
//!
//! Geometry and rendering never fail; only option changes and lookups by name do.
use thiserror::Error;

/// Errors that can occur when creating, configuring or looking up graph objects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("can't find marker \"{0}\"")]
    UnknownMarker(String),

    #[error("can't find element \"{0}\"")]
    UnknownElement(String),

    #[error("can't find pen \"{0}\"")]
    UnknownPen(String),

    #[error("can't find axis \"{0}\"")]
    UnknownAxis(String),

    #[error("{kind} \"{name}\" already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("bad value \"{value}\" for option \"-{option}\"")]
    InvalidValue { option: &'static str, value: String },

    #[error("odd number of values in coordinate list ({0})")]
    OddCoordinates(usize),

    #[error("bad dash list: {0}")]
    InvalidDashes(String),

    #[error("bad event pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{name}: options are for a {found} marker, expected {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("pen \"{0}\" is still in use")]
    PenInUse(String),

    #[error("axis \"{0}\" is still in use")]
    AxisInUse(String),

    #[error("axis \"{name}\": min {min} must be less than max {max}")]
    InvalidAxisLimits { name: String, min: f64, max: f64 },

    #[error("window \"{0}\" is already managed by another marker")]
    WindowInUse(String),
}

impl GraphError {
    pub(crate) fn invalid(option: &'static str, value: impl ToString) -> Self {
        Self::InvalidValue {
            option,
            value: value.to_string(),
        }
    }
}
