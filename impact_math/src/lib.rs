//! # Impact Math
//!
//! Numeric building blocks for event impact modeling.
//! This crate provides the temporal effect function used to shape an
//! event's influence over time, linear trend fitting for baselines, and
//! the error metrics used to score predicted trajectories.

use thiserror::Error;

pub mod effect;
pub mod metrics;
pub mod trend;

pub use effect::{apply_effect, apply_effect_with, EffectParams, EffectShape, DAYS_PER_MONTH};
pub use metrics::{forecast_accuracy, ForecastAccuracy};
pub use trend::{LinearTrend, TrendMethod};

/// Errors that can occur in impact calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Unknown effect shape: {0}")]
    UnknownShape(String),
}

/// Result type for impact math operations
pub type Result<T> = std::result::Result<T, MathError>;
