//! Validation configuration

use crate::error::{ImpactError, Result};
use crate::utils::date_in_year;
use impact_math::TrendMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of a validation run.
///
/// The defaults reproduce the reference setup: a pre-2016 baseline window,
/// a 2015-2025 evaluation horizon sampled on June 30 of each year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Observations strictly before this year form the baseline window
    pub cutoff_year: i32,
    /// Minimum observations an indicator needs overall
    pub min_total_points: usize,
    /// Minimum observations inside the baseline window
    pub min_baseline_points: usize,
    /// First evaluation year
    pub horizon_start: i32,
    /// Last evaluation year, inclusive
    pub horizon_end: i32,
    pub mid_year_month: u32,
    pub mid_year_day: u32,
    pub trend_method: TrendMethod,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cutoff_year: 2016,
            min_total_points: 3,
            min_baseline_points: 2,
            horizon_start: 2015,
            horizon_end: 2025,
            mid_year_month: 6,
            mid_year_day: 30,
            trend_method: TrendMethod::Auto,
        }
    }
}

impl ValidationConfig {
    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.horizon_end < self.horizon_start {
            return Err(ImpactError::InvalidParameter(format!(
                "Evaluation horizon {}..={} is empty",
                self.horizon_start, self.horizon_end
            )));
        }
        if self.min_baseline_points < 2 {
            return Err(ImpactError::InvalidParameter(
                "At least 2 baseline points are needed to fit a trend".to_string(),
            ));
        }
        if self.min_total_points < 2 {
            return Err(ImpactError::InvalidParameter(
                "At least 2 historical points are needed overall".to_string(),
            ));
        }
        // Every year between start and end must be able to hold the date
        for year in self.horizon_start..=self.horizon_end {
            date_in_year(year, self.mid_year_month, self.mid_year_day)?;
        }
        Ok(())
    }

    /// Evaluation years, in order
    pub fn horizon_years(&self) -> Vec<i32> {
        (self.horizon_start..=self.horizon_end).collect()
    }

    /// Parse and check a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and check a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
