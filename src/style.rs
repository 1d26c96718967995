//! Style palettes: per-point pen selection by weight.
use crate::error::GraphError;

const EPSILON: f64 = f64::EPSILON * 4.0;

/// Closed weight interval `[min, max]` with a small tolerance at both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

impl WeightRange {
    pub fn new(min: f64, max: f64) -> Result<Self, GraphError> {
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(GraphError::invalid("weight", format!("{min} {max}")));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, weight: f64) -> bool {
        let range = self.max - self.min;
        if range < EPSILON {
            return (self.max - weight).abs() < EPSILON;
        }
        let norm = (weight - self.min) / range;
        norm >= -EPSILON && (norm - 1.0) < EPSILON
    }
}

/// One palette entry: a pen name and the weights it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct PenStyle {
    pub pen: String,
    /// `None` lets the palette assign `[k, k + 1]`, `k` being the entry's
    /// position among the user entries.
    pub range: Option<WeightRange>,
}

impl PenStyle {
    pub fn new(pen: impl Into<String>) -> Self {
        Self {
            pen: pen.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Result<Self, GraphError> {
        self.range = Some(WeightRange::new(min, max)?);
        Ok(self)
    }

    fn effective_range(&self, k: usize) -> WeightRange {
        self.range.unwrap_or(WeightRange {
            min: k as f64,
            max: k as f64 + 1.0,
        })
    }
}

/// Map every point to a palette slot.
///
/// Slot 0 is the element's normal pen; slot `k + 1` is `styles[k]`. Entries
/// are scanned from last to first so later entries override earlier ones
/// where their ranges overlap. Points without a weight get slot 0.
pub fn style_map(styles: &[PenStyle], weights: Option<&[f64]>, count: usize) -> Vec<usize> {
    let mut slots = vec![0; count];
    let Some(weights) = weights else {
        return slots;
    };
    if styles.is_empty() {
        return slots;
    }
    for (slot, weight) in slots.iter_mut().zip(weights) {
        if weight.is_nan() {
            continue;
        }
        if let Some(k) = styles
            .iter()
            .enumerate()
            .rev()
            .find(|(k, style)| style.effective_range(*k).contains(*weight))
            .map(|(k, _)| k)
        {
            *slot = k + 1;
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_overlapping_entry_wins() {
        let styles = vec![
            PenStyle::new("low").with_range(0.0, 10.0).unwrap(),
            PenStyle::new("high").with_range(5.0, 15.0).unwrap(),
        ];
        let map = style_map(&styles, Some(&[7.0, 2.0, 14.0, 40.0]), 4);
        assert_eq!(map, vec![2, 1, 2, 0]);
    }

    #[test]
    fn points_without_weights_use_normal_pen() {
        let styles = vec![PenStyle::new("a").with_range(0.0, 1.0).unwrap()];
        assert_eq!(style_map(&styles, Some(&[0.5]), 3), vec![1, 0, 0]);
        assert_eq!(style_map(&styles, None, 2), vec![0, 0]);
        assert_eq!(style_map(&[], Some(&[0.5]), 1), vec![0]);
    }

    #[test]
    fn implicit_ranges_follow_position() {
        let styles = vec![PenStyle::new("a"), PenStyle::new("b")];
        assert_eq!(style_map(&styles, Some(&[0.5, 1.5, 2.5]), 3), vec![1, 2, 0]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let r = WeightRange::new(2.0, 4.0).unwrap();
        assert!(r.contains(2.0));
        assert!(r.contains(4.0));
        assert!(!r.contains(4.1));
        let point = WeightRange::new(3.0, 3.0).unwrap();
        assert!(point.contains(3.0));
        assert!(!point.contains(3.5));
        assert!(WeightRange::new(5.0, 1.0).is_err());
    }
}
