//! Window markers: an embedded child window placed at a data coordinate.
//!
//! The graph does not own child windows. It claims them through a
//! [`WindowHost`] and tells the host where to place them after each layout.
use crate::error::GraphError;
use crate::geometry::{Anchor, Point2d, Region2d};

/// Geometry management for embedded child windows.
pub trait WindowHost {
    /// Take ownership of `window` for a marker and return its requested size.
    /// Fails with [`GraphError::WindowInUse`] if another marker holds it.
    fn claim(&mut self, window: &str) -> Result<(f64, f64), GraphError>;

    /// Give `window` back. It is unmapped first if visible.
    fn release(&mut self, window: &str);

    /// Show `window` at `region`.
    fn place(&mut self, window: &str, region: Region2d);

    /// Hide `window` without releasing it.
    fn unmap(&mut self, window: &str);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowAttrs {
    /// Name of the child window.
    pub window: Option<String>,
    /// Overrides the requested width.
    pub width: Option<f64>,
    /// Overrides the requested height.
    pub height: Option<f64>,
    pub(crate) requested: (f64, f64),
}

impl WindowAttrs {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        for (option, v) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = v
                && (v.is_nan() || v < 0.0)
            {
                return Err(GraphError::invalid(option, v));
            }
        }
        Ok(())
    }

    pub(crate) fn same_geometry(&self, other: &Self) -> bool {
        self.window == other.window
            && self.width == other.width
            && self.height == other.height
            && self.requested == other.requested
    }

    fn size(&self) -> (f64, f64) {
        (
            self.width.unwrap_or(self.requested.0),
            self.height.unwrap_or(self.requested.1),
        )
    }
}

/// Screen geometry of a mapped window marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowGeometry {
    pub region: Region2d,
}

pub(super) fn map(at: Point2d, attrs: &WindowAttrs, anchor: Anchor) -> Option<(WindowGeometry, Region2d)> {
    attrs.window.as_ref()?;
    let (w, h) = attrs.size();
    if w <= 0.0 || h <= 0.0 || !at.is_finite() {
        return None;
    }
    let top_left = crate::geometry::anchor_point(at.x, at.y, w, h, anchor);
    let region = Region2d::new(top_left.x, top_left.y, top_left.x + w, top_left.y + h);
    Some((WindowGeometry { region }, region))
}

pub(super) fn point_in(g: &WindowGeometry, sample: Point2d) -> bool {
    g.region.contains(sample)
}

pub(super) fn region_in(g: &WindowGeometry, region: &Region2d, enclosed: bool) -> bool {
    if enclosed {
        region.encloses(&g.region)
    } else {
        region.intersects(&g.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_size_overrides_request() {
        let attrs = WindowAttrs {
            window: Some(".b".into()),
            width: Some(30.0),
            requested: (100.0, 20.0),
            ..WindowAttrs::default()
        };
        let (g, _) = map(Point2d::new(50.0, 50.0), &attrs, Anchor::Center).unwrap();
        assert_eq!(g.region, Region2d::new(35.0, 40.0, 65.0, 60.0));
    }

    #[test]
    fn without_window_nothing_maps() {
        let attrs = WindowAttrs {
            width: Some(10.0),
            height: Some(10.0),
            ..WindowAttrs::default()
        };
        assert!(map(Point2d::ZERO, &attrs, Anchor::Center).is_none());
    }
}
