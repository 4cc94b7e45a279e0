//! Event impact propagation
//!
//! Folds the effect of every applicable event into a base trajectory. For
//! each date, events are visited in ascending event-date order (ties in
//! catalog order) and each one adjusts the running value produced by the
//! events before it, so effects compound multiplicatively rather than add.

use crate::error::{ImpactError, Result};
use crate::matrix::ImpactMatrix;
use crate::types::{Event, EventCatalog, Trajectory, TrajectoryKind, TrajectoryPoint};
use crate::utils::months_between;
use chrono::NaiveDate;
use impact_math::{apply_effect_with, EffectParams, EffectShape};
use log::debug;
use serde::Serialize;

/// One event's adjustment of the running value at a single date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub event_id: String,
    /// Lag-adjusted months since the event's onset
    pub elapsed_months: f64,
    pub magnitude: f64,
    pub before: f64,
    pub after: f64,
}

/// Immutable view over an impact matrix and event catalog
#[derive(Debug, Clone)]
pub struct Propagator<'a> {
    matrix: &'a ImpactMatrix,
    schedule: Vec<(&'a Event, NaiveDate)>,
    params: EffectParams,
}

impl<'a> Propagator<'a> {
    /// Create a propagator. Dated events with a matrix row are scheduled in
    /// date order; undated events never contribute.
    pub fn new(matrix: &'a ImpactMatrix, catalog: &'a EventCatalog) -> Self {
        let schedule = catalog
            .dated_in_order()
            .into_iter()
            .filter(|e| matrix.has_event(&e.id))
            .filter_map(|e| e.date.map(|d| (e, d)))
            .collect();

        Self {
            matrix,
            schedule,
            params: EffectParams::default(),
        }
    }

    /// Use custom shape constants
    pub fn with_params(mut self, params: EffectParams) -> Self {
        self.params = params;
        self
    }

    pub fn matrix(&self) -> &ImpactMatrix {
        self.matrix
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    /// Scheduled event ids, in application order
    pub fn schedule(&self) -> Vec<&str> {
        self.schedule.iter().map(|(e, _)| e.id.as_str()).collect()
    }

    /// Predict a trajectory for `indicator`.
    ///
    /// An indicator that is not a matrix column has no events affecting it,
    /// so the base values come back unchanged.
    pub fn predict(&self, indicator: &str, base: &Trajectory, shape: EffectShape) -> Trajectory {
        let points = base
            .points()
            .iter()
            .map(|p| TrajectoryPoint {
                date: p.date,
                value: self.predict_value(indicator, p.date, p.value, shape),
            })
            .collect();

        Trajectory::new(TrajectoryKind::Predicted, points)
    }

    /// Like [`predict`](Self::predict), but an untracked indicator is an error
    pub fn predict_strict(
        &self,
        indicator: &str,
        base: &Trajectory,
        shape: EffectShape,
    ) -> Result<Trajectory> {
        if !self.matrix.has_indicator(indicator) {
            return Err(ImpactError::UnknownIndicatorColumn(indicator.to_string()));
        }
        Ok(self.predict(indicator, base, shape))
    }

    /// Predicted value for a single date
    pub fn predict_value(
        &self,
        indicator: &str,
        date: NaiveDate,
        base_value: f64,
        shape: EffectShape,
    ) -> f64 {
        self.fold(indicator, date, base_value, shape, |_| {})
    }

    /// Per-event running values for a single date, in application order
    pub fn contributions(
        &self,
        indicator: &str,
        date: NaiveDate,
        base_value: f64,
        shape: EffectShape,
    ) -> Vec<Contribution> {
        let mut steps = Vec::new();
        self.fold(indicator, date, base_value, shape, |c| steps.push(c));
        steps
    }

    fn fold<F>(
        &self,
        indicator: &str,
        date: NaiveDate,
        base_value: f64,
        shape: EffectShape,
        mut observe: F,
    ) -> f64
    where
        F: FnMut(Contribution),
    {
        let mut current = base_value;

        for (event, event_date) in &self.schedule {
            let cell = match self.matrix.cell(&event.id, indicator) {
                Some(cell) if cell.magnitude != 0.0 => cell,
                _ => continue,
            };

            let elapsed = months_between(date, *event_date) - f64::from(cell.lag_months);
            let next = apply_effect_with(current, cell.magnitude, elapsed, shape, &self.params);

            debug!(
                "{} on {}: event {} elapsed {:.2} months, {:.6} -> {:.6}",
                indicator, date, event.id, elapsed, current, next
            );

            observe(Contribution {
                event_id: event.id.clone(),
                elapsed_months: elapsed,
                magnitude: cell.magnitude,
                before: current,
                after: next,
            });
            current = next;
        }

        current
    }
}

/// Stateless form of [`Propagator::predict`]
pub fn predict(
    matrix: &ImpactMatrix,
    catalog: &EventCatalog,
    indicator: &str,
    base: &Trajectory,
    shape: EffectShape,
) -> Trajectory {
    Propagator::new(matrix, catalog).predict(indicator, base, shape)
}
