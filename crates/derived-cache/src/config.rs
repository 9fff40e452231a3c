//! Configuration for the derived-data cache.

use grid_processor::{IqrFences, OutlierMethod, PercentileTrim, ValueRangeComputer};
use renderer::DEFAULT_PARALLEL_ROWS;
use serde::{Deserialize, Serialize};

/// Configuration for the derived-data cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Strategy used when outliers are excluded from a range.
    pub outlier_method: OutlierMethod,

    /// Fence multiplier `k` for the IQR strategy.
    pub iqr_multiplier: f64,

    /// Lower percentile (0-100) for the percentile strategy.
    pub percentile_lower: f64,

    /// Upper percentile (0-100) for the percentile strategy.
    pub percentile_upper: f64,

    /// Grids with at least this many rows are rasterized in parallel.
    pub raster_parallel_rows: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            outlier_method: OutlierMethod::Iqr,
            iqr_multiplier: 1.5,
            percentile_lower: 2.0,
            percentile_upper: 98.0,
            raster_parallel_rows: DEFAULT_PARALLEL_ROWS,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("OUTLIER_STRATEGY") {
            config.outlier_method = OutlierMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("OUTLIER_IQR_MULTIPLIER") {
            if let Ok(k) = val.parse() {
                config.iqr_multiplier = k;
            }
        }

        if let Ok(val) = std::env::var("OUTLIER_PERCENTILE_LOWER") {
            if let Ok(p) = val.parse() {
                config.percentile_lower = p;
            }
        }

        if let Ok(val) = std::env::var("OUTLIER_PERCENTILE_UPPER") {
            if let Ok(p) = val.parse() {
                config.percentile_upper = p;
            }
        }

        if let Ok(val) = std::env::var("RASTER_PARALLEL_ROWS") {
            if let Ok(rows) = val.parse() {
                config.raster_parallel_rows = rows;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err("iqr_multiplier must be a non-negative number".to_string());
        }

        if !(0.0..=100.0).contains(&self.percentile_lower)
            || !(0.0..=100.0).contains(&self.percentile_upper)
        {
            return Err("percentiles must be within 0-100".to_string());
        }

        if self.percentile_lower >= self.percentile_upper {
            return Err("percentile_lower must be below percentile_upper".to_string());
        }

        if self.raster_parallel_rows == 0 {
            return Err("raster_parallel_rows must be > 0".to_string());
        }

        Ok(())
    }

    /// Range computer using the configured outlier strategy.
    pub fn range_computer(&self) -> ValueRangeComputer {
        match self.outlier_method {
            OutlierMethod::Iqr => ValueRangeComputer::new(IqrFences {
                multiplier: self.iqr_multiplier,
            }),
            OutlierMethod::Percentile => ValueRangeComputer::new(PercentileTrim {
                lower: self.percentile_lower,
                upper: self.percentile_upper,
            }),
        }
    }
}
