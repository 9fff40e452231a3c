//! Numeric value ranges.
//!
//! A missing range is modelled as `Option<ValueRange>::None`. Ranges form a
//! monoid under [`ValueRange::combine`]: `None` is the identity and two
//! defined ranges combine to their elementwise min/max.

use serde::Serialize;

/// A closed `[min, max]` interval with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    min: f64,
    max: f64,
}

impl ValueRange {
    /// Create a range, rejecting NaN bounds and `min > max`.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return None;
        }
        Some(Self { min, max })
    }

    /// A degenerate range holding a single value.
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Min/max over every non-NaN value. `None` when nothing was observed.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<Self>, v| {
                Some(match acc {
                    Some(range) => range.include(v),
                    None => Self::point(v),
                })
            })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Extend the range to cover `value`.
    pub fn include(self, value: f64) -> Self {
        if value.is_nan() {
            return self;
        }
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    /// Elementwise min/max of two defined ranges.
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Monoid combine: an absent side is the identity.
    pub fn combine(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }

    /// Overlap of two ranges, `None` when they are disjoint.
    pub fn intersect(self, other: Self) -> Option<Self> {
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// `true` when this range is fully inside `outer`.
    pub fn is_within(&self, outer: &ValueRange) -> bool {
        self.min >= outer.min && self.max <= outer.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Position of `value` inside the range, clamped to `[0, 1]`.
    ///
    /// A degenerate range maps every value to `1.0`, the terminal end.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 1.0;
        }
        ((value - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_inverted() {
        assert!(ValueRange::new(2.0, 1.0).is_none());
        assert!(ValueRange::new(f64::NAN, 1.0).is_none());
        assert!(ValueRange::new(1.0, 1.0).is_some());
    }

    #[test]
    fn test_from_values() {
        let range = ValueRange::from_values(vec![3.0, 7.0, 7.0, 10.0]).unwrap();
        assert_eq!(range.min(), 3.0);
        assert_eq!(range.max(), 10.0);
        assert!(ValueRange::from_values(Vec::new()).is_none());
        assert!(ValueRange::from_values(vec![f64::NAN]).is_none());
    }

    #[test]
    fn test_combine_identity() {
        let a = ValueRange::new(5.0, 10.0);
        let b = ValueRange::new(2.0, 8.0);
        assert_eq!(ValueRange::combine(a, None), a);
        assert_eq!(ValueRange::combine(None, b), b);
        assert_eq!(ValueRange::combine(None, None), None);

        let merged = ValueRange::combine(a, b).unwrap();
        assert_eq!((merged.min(), merged.max()), (2.0, 10.0));
    }

    #[test]
    fn test_normalize() {
        let range = ValueRange::new(0.0, 10.0).unwrap();
        assert_eq!(range.normalize(5.0), 0.5);
        assert_eq!(range.normalize(-5.0), 0.0);
        assert_eq!(range.normalize(50.0), 1.0);
        assert_eq!(ValueRange::point(4.0).normalize(4.0), 1.0);
    }
}
