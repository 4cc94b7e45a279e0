//! Validation of propagated trajectories against held-out history
//!
//! A baseline trend is fitted to the pre-intervention window, projected over
//! the evaluation horizon, run through the propagator and compared with the
//! actual observation of each evaluation year.

use crate::config::ValidationConfig;
use crate::error::{ImpactError, Result};
use crate::propagator::Propagator;
use crate::types::{Indicator, Trajectory};
use crate::utils::yearly_dates;
use impact_math::metrics::{mean_absolute_error, mean_absolute_percentage_error};
use impact_math::{EffectShape, LinearTrend};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of validating one indicator under one effect shape.
///
/// Values are on the normalized scale (divided by [`scale`](Self::scale)).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    indicator: String,
    shape: EffectShape,
    scale: f64,
    trend: LinearTrend,
    baseline_points: usize,
    years: Vec<i32>,
    base_values: Vec<f64>,
    predicted_values: Vec<f64>,
    aligned_years: Vec<i32>,
    aligned_base: Vec<f64>,
    aligned_predicted: Vec<f64>,
    aligned_actual: Vec<f64>,
    mae: f64,
    mape: f64,
}

impl ValidationResult {
    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn shape(&self) -> EffectShape {
        self.shape
    }

    /// Divisor applied to the indicator's values before fitting
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Baseline trend, anchored at the first evaluation year
    pub fn trend(&self) -> &LinearTrend {
        &self.trend
    }

    /// Number of observations in the baseline window
    pub fn baseline_points(&self) -> usize {
        self.baseline_points
    }

    /// Every evaluation year
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Baseline-only value for each evaluation year
    pub fn base_values(&self) -> &[f64] {
        &self.base_values
    }

    /// Event-adjusted value for each evaluation year
    pub fn predicted_values(&self) -> &[f64] {
        &self.predicted_values
    }

    /// Evaluation years that have an actual observation
    pub fn aligned_years(&self) -> &[i32] {
        &self.aligned_years
    }

    pub fn aligned_base(&self) -> &[f64] {
        &self.aligned_base
    }

    pub fn aligned_predicted(&self) -> &[f64] {
        &self.aligned_predicted
    }

    pub fn aligned_actual(&self) -> &[f64] {
        &self.aligned_actual
    }

    /// Mean absolute error on the normalized scale
    pub fn mae(&self) -> f64 {
        self.mae
    }

    /// Mean absolute percentage error, in percent
    pub fn mape(&self) -> f64 {
        self.mape
    }
}

/// Validate one indicator against a propagator.
///
/// Pure: the same inputs always give the same result.
pub fn validate_indicator(
    indicator: &Indicator,
    propagator: &Propagator<'_>,
    config: &ValidationConfig,
    shape: EffectShape,
) -> Result<ValidationResult> {
    let code = indicator.code();

    if indicator.len() < config.min_total_points {
        return Err(ImpactError::InsufficientData {
            indicator: code.to_string(),
            required: config.min_total_points,
            found: indicator.len(),
            window: "historical".to_string(),
        });
    }

    let scale = indicator.scale();
    let early: Vec<_> = indicator
        .observations()
        .iter()
        .filter(|o| o.year() < config.cutoff_year)
        .collect();

    if early.len() < config.min_baseline_points {
        return Err(ImpactError::InsufficientData {
            indicator: code.to_string(),
            required: config.min_baseline_points,
            found: early.len(),
            window: format!("pre-{}", config.cutoff_year),
        });
    }

    let distinct_years: BTreeSet<i32> = early.iter().map(|o| o.year()).collect();
    if distinct_years.len() < 2 {
        return Err(ImpactError::InsufficientData {
            indicator: code.to_string(),
            required: 2,
            found: distinct_years.len(),
            window: format!("distinct pre-{} year", config.cutoff_year),
        });
    }

    let xs: Vec<f64> = early.iter().map(|o| f64::from(o.year())).collect();
    let ys: Vec<f64> = early.iter().map(|o| o.value / scale).collect();
    let trend = LinearTrend::fit(&xs, &ys, config.trend_method)?
        .reanchored(f64::from(config.horizon_start));

    debug!(
        "{} baseline trend: {:.4} per year, {:.4} at {}",
        code,
        trend.slope(),
        trend.intercept(),
        config.horizon_start
    );

    let years = config.horizon_years();
    let dates = yearly_dates(
        config.horizon_start,
        config.horizon_end,
        config.mid_year_month,
        config.mid_year_day,
    )?;
    let base_values: Vec<f64> = years
        .iter()
        .map(|&year| trend.value_at(f64::from(year)))
        .collect();

    let base = Trajectory::base(&dates, &base_values)?;
    let predicted_values = propagator.predict(code, &base, shape).values();

    let actual_by_year = Trajectory::actual(indicator).first_per_year();
    let mut aligned_years = Vec::new();
    let mut aligned_base = Vec::new();
    let mut aligned_predicted = Vec::new();
    let mut aligned_actual = Vec::new();

    for (i, year) in years.iter().enumerate() {
        if let Some(actual) = actual_by_year.get(year) {
            aligned_years.push(*year);
            aligned_base.push(base_values[i]);
            aligned_predicted.push(predicted_values[i]);
            aligned_actual.push(actual / scale);
        }
    }

    // MAPE needs at least one non-zero actual
    if aligned_actual.iter().all(|&a| a == 0.0) {
        return Err(ImpactError::ValidationFailed {
            indicator: code.to_string(),
        });
    }

    let mae = mean_absolute_error(&aligned_predicted, &aligned_actual)?;
    let mape = mean_absolute_percentage_error(&aligned_predicted, &aligned_actual)?;

    info!(
        "Validated {} ({}): MAE {:.4}, MAPE {:.2}% over {} years",
        code,
        shape,
        mae,
        mape,
        aligned_years.len()
    );

    Ok(ValidationResult {
        indicator: code.to_string(),
        shape,
        scale,
        trend,
        baseline_points: early.len(),
        years,
        base_values,
        predicted_values,
        aligned_years,
        aligned_base,
        aligned_predicted,
        aligned_actual,
        mae,
        mape,
    })
}

/// An indicator a batch run could not validate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedIndicator {
    pub indicator: String,
    pub reason: String,
}

/// Results of validating several indicators
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub validated: Vec<ValidationResult>,
    pub skipped: Vec<SkippedIndicator>,
}

impl BatchOutcome {
    /// Mean MAPE over validated indicators
    pub fn average_mape(&self) -> Option<f64> {
        if self.validated.is_empty() {
            return None;
        }
        let total: f64 = self.validated.iter().map(|r| r.mape()).sum();
        Some(total / self.validated.len() as f64)
    }
}

/// Validates indicators and keeps the most recent result for each
#[derive(Debug)]
pub struct Validator<'a> {
    indicators: &'a BTreeMap<String, Indicator>,
    propagator: Propagator<'a>,
    config: ValidationConfig,
    results: BTreeMap<String, ValidationResult>,
}

impl<'a> Validator<'a> {
    /// Create a validator, rejecting an inconsistent configuration
    pub fn new(
        indicators: &'a BTreeMap<String, Indicator>,
        propagator: Propagator<'a>,
        config: ValidationConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            indicators,
            propagator,
            config,
            results: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn propagator(&self) -> &Propagator<'a> {
        &self.propagator
    }

    /// Validate one indicator and record the result, replacing any earlier one
    pub fn validate(&mut self, code: &str, shape: EffectShape) -> Result<&ValidationResult> {
        let indicator = self
            .indicators
            .get(code)
            .ok_or_else(|| ImpactError::InsufficientData {
                indicator: code.to_string(),
                required: self.config.min_total_points,
                found: 0,
                window: "historical".to_string(),
            })?;

        let result = validate_indicator(indicator, &self.propagator, &self.config, shape)?;
        self.results.insert(code.to_string(), result);
        self.results
            .get(code)
            .ok_or_else(|| ImpactError::DataError(format!("result for {} was not stored", code)))
    }

    /// Validate with a shape given as a tag; unknown tags fail loudly
    pub fn validate_tagged(&mut self, code: &str, shape: &str) -> Result<&ValidationResult> {
        let shape: EffectShape = shape.parse()?;
        self.validate(code, shape)
    }

    /// Validate several indicators.
    ///
    /// Recoverable failures are collected as skipped indicators; any other
    /// error aborts the batch.
    pub fn validate_all<I, S>(&mut self, codes: I, shape: EffectShape) -> Result<BatchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = BatchOutcome::default();

        for code in codes {
            let code = code.as_ref();
            match self.validate(code, shape) {
                Ok(result) => outcome.validated.push(result.clone()),
                Err(err) if err.is_recoverable() => {
                    warn!("Skipping {}: {}", code, err);
                    outcome.skipped.push(SkippedIndicator {
                        indicator: code.to_string(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(avg) = outcome.average_mape() {
            info!(
                "Validated {} indicators, skipped {}, average MAPE {:.2}%",
                outcome.validated.len(),
                outcome.skipped.len(),
                avg
            );
        }

        Ok(outcome)
    }

    /// Most recent result for an indicator
    pub fn result(&self, code: &str) -> Option<&ValidationResult> {
        self.results.get(code)
    }

    /// Most recent results, keyed by indicator code
    pub fn results(&self) -> &BTreeMap<String, ValidationResult> {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{ImpactMatrix, ImpactMatrixBuilder};
    use crate::types::{Direction, Event, EventCatalog, ImpactLink, Observation};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn indicator(code: &str, unit: &str, points: &[(i32, f64)]) -> Indicator {
        let observations = points
            .iter()
            .map(|&(y, v)| Observation::new(date(y, 12, 31), v))
            .collect();
        Indicator::new(code, code, unit, observations).unwrap()
    }

    fn empty_matrix(catalog: &EventCatalog) -> ImpactMatrix {
        ImpactMatrixBuilder::new(["ACC_OWNERSHIP"])
            .unwrap()
            .build(&[], catalog)
            .unwrap()
    }

    #[test]
    fn test_baseline_only_projection() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        let ind = indicator("ACC_OWNERSHIP", "%", &[(2011, 14.0), (2014, 22.0), (2015, 42.0), (2017, 35.0)]);

        let result =
            validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual).unwrap();

        // Three pre-2016 points, so least squares
        assert_eq!(result.baseline_points(), 3);
        assert_eq!(result.years().len(), 11);
        assert_eq!(result.base_values(), result.predicted_values());
        assert_eq!(result.aligned_years(), &[2015, 2017]);
        assert_eq!(result.aligned_actual(), &[0.42, 0.35]);
    }

    #[test]
    fn test_insufficient_total_points() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        let ind = indicator("ACC_OWNERSHIP", "%", &[(2011, 14.0), (2014, 22.0)]);

        let err = validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual)
            .unwrap_err();
        assert!(matches!(err, ImpactError::InsufficientData { required: 3, found: 2, .. }));
    }

    #[test]
    fn test_insufficient_baseline_points() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        let ind = indicator("ACC_OWNERSHIP", "%", &[(2014, 22.0), (2017, 35.0), (2021, 46.0)]);

        let err = validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual)
            .unwrap_err();
        assert!(matches!(err, ImpactError::InsufficientData { required: 2, found: 1, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_baseline_needs_distinct_years() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        let observations = vec![
            Observation::new(date(2014, 3, 1), 20.0),
            Observation::new(date(2014, 9, 1), 21.0),
            Observation::new(date(2017, 9, 1), 30.0),
        ];
        let ind = Indicator::new("ACC_OWNERSHIP", "Account", "%", observations).unwrap();

        let err = validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual)
            .unwrap_err();
        assert!(matches!(err, ImpactError::InsufficientData { found: 1, .. }));
    }

    #[test]
    fn test_no_overlap_fails_validation() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        let ind = indicator("ACC_OWNERSHIP", "%", &[(2008, 10.0), (2010, 12.0), (2012, 14.0)]);

        let err = validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual)
            .unwrap_err();
        assert!(matches!(err, ImpactError::ValidationFailed { .. }));
    }

    #[test]
    fn test_zero_actuals_do_not_dilute_mape() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        // Baseline of one per year reaching 10 in 2020 and 11 in 2021
        let ind = indicator("CNT", "count", &[(2013, 3.0), (2014, 4.0), (2020, 0.0), (2021, 10.0)]);

        let result =
            validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual).unwrap();

        assert_eq!(result.aligned_years(), &[2020, 2021]);
        assert_relative_eq!(result.aligned_predicted()[0], 10.0, epsilon = 1e-9);
        assert_relative_eq!(result.mae(), 5.5, epsilon = 1e-9);
        assert_relative_eq!(result.mape(), 10.0, epsilon = 1e-9);
        assert_eq!(
            crate::report::PerformanceStatus::from_mape(result.mape()),
            crate::report::PerformanceStatus::Fair
        );
    }

    #[test]
    fn test_only_zero_actuals_fails_validation() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let propagator = Propagator::new(&matrix, &catalog);
        let ind = indicator("CNT", "count", &[(2013, 3.0), (2014, 4.0), (2020, 0.0)]);

        let err = validate_indicator(&ind, &propagator, &ValidationConfig::default(), EffectShape::Gradual)
            .unwrap_err();
        assert!(matches!(err, ImpactError::ValidationFailed { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_validator_records_latest_and_batches() {
        let catalog = EventCatalog::new(vec![Event::new(
            "E1",
            "Launch",
            "product_launch",
            Some(date(2018, 6, 1)),
        )])
        .unwrap();
        let links = vec![ImpactLink::new("E1", "ACC_OWNERSHIP", Direction::Increase, 0.05, 24).unwrap()];
        let matrix = ImpactMatrixBuilder::new(["ACC_OWNERSHIP"])
            .unwrap()
            .build(&links, &catalog)
            .unwrap();

        let mut indicators = BTreeMap::new();
        indicators.insert(
            "ACC_OWNERSHIP".to_string(),
            indicator("ACC_OWNERSHIP", "%", &[(2011, 14.0), (2015, 42.0), (2024, 49.0)]),
        );
        indicators.insert(
            "USG_P2P_COUNT".to_string(),
            indicator("USG_P2P_COUNT", "count", &[(2023, 5.0)]),
        );

        let propagator = Propagator::new(&matrix, &catalog);
        let mut validator = Validator::new(&indicators, propagator, ValidationConfig::default()).unwrap();

        let gradual_mape = validator.validate("ACC_OWNERSHIP", EffectShape::Gradual).unwrap().mape();
        let immediate_mape = validator.validate("ACC_OWNERSHIP", EffectShape::Immediate).unwrap().mape();
        assert_eq!(validator.result("ACC_OWNERSHIP").unwrap().shape(), EffectShape::Immediate);
        assert_relative_eq!(gradual_mape, immediate_mape, epsilon = 1e-9);

        let outcome = validator
            .validate_all(["ACC_OWNERSHIP", "USG_P2P_COUNT", "MISSING"], EffectShape::Gradual)
            .unwrap();
        assert_eq!(outcome.validated.len(), 1);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[1].indicator, "MISSING");
        assert_eq!(validator.results().len(), 1);
    }

    #[test]
    fn test_unknown_shape_tag_is_fatal() {
        let catalog = EventCatalog::default();
        let matrix = empty_matrix(&catalog);
        let indicators = BTreeMap::new();
        let mut validator =
            Validator::new(&indicators, Propagator::new(&matrix, &catalog), ValidationConfig::default()).unwrap();

        let err = validator.validate_tagged("ACC_OWNERSHIP", "exponential").unwrap_err();
        assert!(matches!(err, ImpactError::UnknownEffectShape(_)));
        assert!(!err.is_recoverable());
    }
}
