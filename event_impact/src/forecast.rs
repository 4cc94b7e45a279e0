//! Baseline trend forecasting with scenario multipliers
//!
//! Independent of event propagation: fits a least-squares line to an
//! indicator's full history and extrapolates it, with a residual-based band
//! and slope-scaled scenarios.

use crate::error::{ImpactError, Result};
use crate::types::Indicator;
use impact_math::metrics::{mean_absolute_error, std_dev};
use impact_math::LinearTrend;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// z-score of the two-sided 95% band
const Z_95: f64 = 1.96;

/// A named slope multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub trend_multiplier: f64,
}

impl Scenario {
    pub fn new(name: impl Into<String>, description: impl Into<String>, trend_multiplier: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            trend_multiplier,
        }
    }
}

/// Ordered set of scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenarios: Vec<Scenario>,
}

impl Default for ScenarioSet {
    fn default() -> Self {
        Self {
            scenarios: vec![
                Scenario::new(
                    "optimistic",
                    "Accelerated digital adoption, successful policy implementation",
                    1.3,
                ),
                Scenario::new("base", "Current trends continue", 1.0),
                Scenario::new("pessimistic", "Slower adoption, implementation challenges", 0.7),
            ],
        }
    }
}

/// Least-squares line fitted to an indicator's history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineModel {
    pub indicator: String,
    /// Anchored at the last observed year
    pub trend: LinearTrend,
    pub mae: f64,
    /// `None` when the history is flat
    pub r_squared: Option<f64>,
    pub residual_std: f64,
    pub last_year: i32,
}

/// Point forecast with a 95% band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub years: Vec<i32>,
    pub values: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Forecast {
    /// `target - forecast` for each year
    pub fn target_gap(&self, target: f64) -> Vec<f64> {
        self.values.iter().map(|v| target - v).collect()
    }
}

/// Forecast of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioForecast {
    pub scenario: String,
    pub years: Vec<i32>,
    pub values: Vec<f64>,
}

impl BaselineModel {
    /// Fit the model; needs at least two distinct observation years
    pub fn fit(indicator: &Indicator) -> Result<Self> {
        let code = indicator.code();
        let years: BTreeSet<i32> = indicator.observations().iter().map(|o| o.year()).collect();

        if indicator.len() < 2 || years.len() < 2 {
            return Err(ImpactError::InsufficientData {
                indicator: code.to_string(),
                required: 2,
                found: years.len(),
                window: "distinct-year".to_string(),
            });
        }

        let xs: Vec<f64> = indicator
            .observations()
            .iter()
            .map(|o| f64::from(o.year()))
            .collect();
        let ys: Vec<f64> = indicator.observations().iter().map(|o| o.value).collect();

        let trend = LinearTrend::least_squares(&xs, &ys)?;
        let fitted: Vec<f64> = xs.iter().map(|&x| trend.value_at(x)).collect();
        let residuals = trend.residuals(&xs, &ys)?;

        let model = Self {
            indicator: code.to_string(),
            trend,
            mae: mean_absolute_error(&fitted, &ys)?,
            r_squared: trend.r_squared(&xs, &ys).ok(),
            residual_std: std_dev(&residuals)?,
            last_year: *years.iter().next_back().unwrap_or(&0),
        };

        debug!(
            "{} baseline: y = {:.3}x + {:.3}, MAE {:.2}",
            code,
            model.trend.slope(),
            model.trend.intercept_at_origin(),
            model.mae
        );

        Ok(model)
    }

    /// Extrapolate to `years` with a ±1.96σ band
    pub fn forecast(&self, years: &[i32]) -> Forecast {
        let margin = Z_95 * self.residual_std;
        let values: Vec<f64> = years
            .iter()
            .map(|&y| self.trend.value_at(f64::from(y)))
            .collect();

        Forecast {
            years: years.to_vec(),
            lower: values.iter().map(|v| v - margin).collect(),
            upper: values.iter().map(|v| v + margin).collect(),
            values,
        }
    }

    /// One forecast per scenario; every scenario passes through the fitted
    /// value at the last observed year
    pub fn scenarios(&self, years: &[i32], set: &ScenarioSet) -> Vec<ScenarioForecast> {
        let pivot = self.trend.reanchored(f64::from(self.last_year));

        set.scenarios
            .iter()
            .map(|scenario| {
                let line = pivot.with_slope_multiplier(scenario.trend_multiplier);
                ScenarioForecast {
                    scenario: scenario.name.clone(),
                    years: years.to_vec(),
                    values: years.iter().map(|&y| line.value_at(f64::from(y))).collect(),
                }
            })
            .collect()
    }
}
