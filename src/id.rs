use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a marker or element.
///
/// Identifiers are never reused, so a stale one simply fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(pub(crate) u64);

impl ShapeId {
    /// Create a new unique shape ID (0, 1, 2, ...).
    pub(crate) fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({})", self.0)
    }
}

/// A pickable object of the graph, as the bind table refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    Marker(ShapeId),
    Element(ShapeId),
}

impl ItemId {
    pub fn shape(self) -> ShapeId {
        match self {
            Self::Marker(id) | Self::Element(id) => id,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker(id) => write!(f, "marker {id}"),
            Self::Element(id) => write!(f, "element {id}"),
        }
    }
}
