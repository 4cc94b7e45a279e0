//! # Event Impact
//!
//! Estimates how discrete events (product launches, policy changes,
//! infrastructure rollouts) shift the trajectories of measured indicators,
//! and checks those estimates against held-out history.
//!
//! ## Features
//!
//! - Event×indicator impact matrix built from directional impact links
//! - Immediate, gradual and delayed effect shapes with reporting lags
//! - Sequential multiplicative propagation of effects over a baseline
//! - Historical validation (MAE, MAPE) against a pre-cutoff trend
//! - Baseline least-squares forecasting with optimistic/base/pessimistic scenarios
//! - CSV loading of records, CSV matrix and JSON report export
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use event_impact::{
//!     Direction, EffectShape, Event, EventCatalog, ImpactLink, ImpactMatrixBuilder, Propagator,
//!     Trajectory,
//! };
//!
//! # fn main() -> event_impact::Result<()> {
//! let catalog = EventCatalog::new(vec![Event::new(
//!     "EVT_TELEBIRR",
//!     "Telebirr launch",
//!     "product_launch",
//!     NaiveDate::from_ymd_opt(2021, 5, 11),
//! )])?;
//!
//! let links = vec![ImpactLink::new("EVT_TELEBIRR", "ACC_MM_ACCOUNT", Direction::Increase, 0.15, 0)?];
//! let matrix = ImpactMatrixBuilder::new(["ACC_MM_ACCOUNT"])?.build(&links, &catalog)?;
//!
//! let dates = [NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()];
//! let base = Trajectory::base(&dates, &[0.20])?;
//!
//! let predicted = Propagator::new(&matrix, &catalog).predict("ACC_MM_ACCOUNT", &base, EffectShape::Immediate);
//! assert!((predicted.values()[0] - 0.23).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod matrix;
pub mod propagator;
pub mod report;
pub mod types;
pub mod utils;
pub mod validator;

// Re-export commonly used types
pub use crate::config::ValidationConfig;
pub use crate::data::{DataLoader, Dataset, EventRecord, ImpactLinkRecord, ObservationRecord};
pub use crate::error::{ImpactError, Result};
pub use crate::forecast::{BaselineModel, Forecast, Scenario, ScenarioForecast, ScenarioSet};
pub use crate::matrix::{DuplicatePolicy, ImpactCell, ImpactMatrix, ImpactMatrixBuilder};
pub use crate::propagator::{predict, Contribution, Propagator};
pub use crate::report::{summary_line, BatchSummary, PerformanceStatus, ValidationRecord, ValidationReport};
pub use crate::types::{
    Direction, Event, EventCatalog, ImpactLink, Indicator, Observation, Trajectory, TrajectoryKind,
    TrajectoryPoint,
};
pub use crate::validator::{validate_indicator, BatchOutcome, SkippedIndicator, ValidationResult, Validator};
pub use impact_math::{EffectParams, EffectShape};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
