//! Value range computation with optional outlier exclusion.

use std::fmt;

use serde::{Deserialize, Serialize};
use taskdata_common::ValueRange;

use crate::decoder::GridCells;

/// Tightens a range by dropping statistically extreme samples.
///
/// Implementations receive the samples sorted ascending, non-empty and free
/// of NaN. The returned range is clamped to the full range by the caller.
pub trait OutlierStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn trim(&self, sorted: &[f64]) -> Option<ValueRange>;
}

/// Linear-interpolated quantile of sorted samples, `q` in `[0, 1]`.
/// `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted {
        [] => return None,
        [only] => return Some(*only),
        _ => {}
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Tukey fences: keep samples within `[Q1 - k*IQR, Q3 + k*IQR]` and report
/// the min/max of what remains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFences {
    pub multiplier: f64,
}

impl Default for IqrFences {
    fn default() -> Self {
        Self { multiplier: 1.5 }
    }
}

impl OutlierStrategy for IqrFences {
    fn name(&self) -> &'static str {
        "iqr"
    }

    fn trim(&self, sorted: &[f64]) -> Option<ValueRange> {
        let q1 = quantile(sorted, 0.25)?;
        let q3 = quantile(sorted, 0.75)?;
        let iqr = q3 - q1;
        let low = q1 - self.multiplier * iqr;
        let high = q3 + self.multiplier * iqr;

        ValueRange::from_values(sorted.iter().copied().filter(|v| *v >= low && *v <= high))
    }
}

/// Clip to the `[lower, upper]` percentiles (0-100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileTrim {
    pub lower: f64,
    pub upper: f64,
}

impl Default for PercentileTrim {
    fn default() -> Self {
        Self {
            lower: 2.0,
            upper: 98.0,
        }
    }
}

impl OutlierStrategy for PercentileTrim {
    fn name(&self) -> &'static str {
        "percentile"
    }

    fn trim(&self, sorted: &[f64]) -> Option<ValueRange> {
        ValueRange::new(
            quantile(sorted, self.lower / 100.0)?,
            quantile(sorted, self.upper / 100.0)?,
        )
    }
}

/// Strategy selector used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    #[default]
    Iqr,
    Percentile,
}

impl OutlierMethod {
    /// Parse from a string, falling back to IQR.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "percentile" | "pct" => Self::Percentile,
            _ => Self::Iqr,
        }
    }
}

/// Computes `{min, max}` over sample values.
#[derive(Debug)]
pub struct ValueRangeComputer {
    strategy: Box<dyn OutlierStrategy>,
}

impl Default for ValueRangeComputer {
    fn default() -> Self {
        Self::new(IqrFences::default())
    }
}

impl ValueRangeComputer {
    pub fn new(strategy: impl OutlierStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Range over all non-NaN samples; `None` when there are none.
    ///
    /// With `exclude_outliers` the strategy's range is returned, clamped to
    /// the full range. A strategy that keeps nothing yields the full range.
    pub fn compute<I>(&self, values: I, exclude_outliers: bool) -> Option<ValueRange>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let full = ValueRange::new(sorted[0], sorted[sorted.len() - 1])?;
        if !exclude_outliers {
            return Some(full);
        }

        let trimmed = self
            .strategy
            .trim(&sorted)
            .and_then(|range| range.intersect(full))
            .unwrap_or(full);
        Some(trimmed)
    }

    /// Range over every data cell of a grid.
    pub fn compute_grid(&self, cells: &GridCells<'_>, exclude_outliers: bool) -> Option<ValueRange> {
        self.compute(cells.values().map(f64::from), exclude_outliers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range() {
        let computer = ValueRangeComputer::default();
        let range = computer.compute(vec![3.0, 7.0, 7.0, 10.0], false).unwrap();
        assert_eq!((range.min(), range.max()), (3.0, 10.0));
    }

    #[test]
    fn test_iqr_trims_low_outlier() {
        let computer = ValueRangeComputer::default();
        let full = computer.compute(vec![3.0, 7.0, 7.0, 10.0], false).unwrap();
        let trimmed = computer.compute(vec![3.0, 7.0, 7.0, 10.0], true).unwrap();
        assert!(trimmed.min() >= 3.0);
        assert!(trimmed.max() <= 10.0);
        assert!(trimmed.is_within(&full));
        assert_eq!((trimmed.min(), trimmed.max()), (7.0, 10.0));
    }

    #[test]
    fn test_empty_input_is_none() {
        let computer = ValueRangeComputer::default();
        assert!(computer.compute(Vec::new(), false).is_none());
        assert!(computer.compute(vec![f64::NAN], true).is_none());
    }

    #[test]
    fn test_single_value() {
        let computer = ValueRangeComputer::default();
        let range = computer.compute(vec![4.0], true).unwrap();
        assert!(range.is_degenerate());
        assert_eq!(range.min(), 4.0);
    }

    #[test]
    fn test_percentile_trim() {
        let computer = ValueRangeComputer::new(PercentileTrim {
            lower: 10.0,
            upper: 90.0,
        });
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let range = computer.compute(values, true).unwrap();
        assert_eq!((range.min(), range.max()), (10.0, 90.0));
        assert_eq!(computer.strategy_name(), "percentile");
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [3.0, 7.0, 7.0, 10.0];
        assert_eq!(quantile(&sorted, 0.25), Some(6.0));
        assert_eq!(quantile(&sorted, 0.75), Some(7.75));
        assert_eq!(quantile(&sorted, 0.0), Some(3.0));
        assert_eq!(quantile(&sorted, 1.0), Some(10.0));
        assert_eq!(quantile(&[42.0], 0.9), Some(42.0));
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(IqrFences::default().trim(&[]), None);
        assert_eq!(PercentileTrim::default().trim(&[]), None);
    }

    #[test]
    fn test_outlier_method_from_str() {
        assert_eq!(OutlierMethod::from_str("PERCENTILE"), OutlierMethod::Percentile);
        assert_eq!(OutlierMethod::from_str("iqr"), OutlierMethod::Iqr);
        assert_eq!(OutlierMethod::from_str("bogus"), OutlierMethod::Iqr);
    }
}
