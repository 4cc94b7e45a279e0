//! Reporting and export of validation results

use crate::error::Result;
use crate::validator::{BatchOutcome, SkippedIndicator, ValidationResult};
use impact_math::EffectShape;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Model performance bucket derived from MAPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerformanceStatus {
    /// Classify a MAPE percentage: <5 excellent, <10 good, <20 fair, else poor
    pub fn from_mape(mape: f64) -> Self {
        if mape < 5.0 {
            PerformanceStatus::Excellent
        } else if mape < 10.0 {
            PerformanceStatus::Good
        } else if mape < 20.0 {
            PerformanceStatus::Fair
        } else {
            PerformanceStatus::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceStatus::Excellent => "excellent",
            PerformanceStatus::Good => "good",
            PerformanceStatus::Fair => "fair",
            PerformanceStatus::Poor => "poor",
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flat per-indicator record for downstream consumers.
///
/// Values are in the indicator's own units; `mape` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub indicator: String,
    pub shape: EffectShape,
    pub mae: f64,
    pub mape: f64,
    pub trend_slope: f64,
    pub trend_intercept_value: f64,
    pub years: Vec<i32>,
    pub predicted: Vec<f64>,
    pub actual: Vec<f64>,
    pub base: Vec<f64>,
    pub status: PerformanceStatus,
}

impl From<&ValidationResult> for ValidationRecord {
    fn from(result: &ValidationResult) -> Self {
        let scale = result.scale();
        let rescale = |values: &[f64]| values.iter().map(|v| v * scale).collect::<Vec<f64>>();
        let trend = result.trend().scaled(scale);

        Self {
            indicator: result.indicator().to_string(),
            shape: result.shape(),
            mae: result.mae() * scale,
            mape: result.mape(),
            trend_slope: trend.slope(),
            trend_intercept_value: trend.intercept(),
            years: result.aligned_years().to_vec(),
            predicted: rescale(result.aligned_predicted()),
            actual: rescale(result.aligned_actual()),
            base: rescale(result.aligned_base()),
            status: PerformanceStatus::from_mape(result.mape()),
        }
    }
}

/// One human-readable line per validated indicator
pub fn summary_line(result: &ValidationResult) -> String {
    format!(
        "{} | MAE {:.4} | MAPE {:.2}% | trend {:+.4}/yr | {}",
        result.indicator(),
        result.mae(),
        result.mape(),
        result.trend().slope(),
        PerformanceStatus::from_mape(result.mape())
    )
}

/// Aggregate view of a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub validated: usize,
    pub average_mape: Option<f64>,
    pub overall: Option<PerformanceStatus>,
    pub skipped: Vec<SkippedIndicator>,
}

impl BatchSummary {
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        let average_mape = outcome.average_mape();
        Self {
            validated: outcome.validated.len(),
            average_mape,
            overall: average_mape.map(PerformanceStatus::from_mape),
            skipped: outcome.skipped.clone(),
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Summary:")?;
        writeln!(f, "  Validated: {}", self.validated)?;
        match (self.average_mape, self.overall) {
            (Some(mape), Some(status)) => {
                writeln!(f, "  Average MAPE: {:.2}%", mape)?;
                writeln!(f, "  Model performance: {}", status)?;
            }
            _ => writeln!(f, "  No validation results available")?,
        }
        for skipped in &self.skipped {
            writeln!(f, "  Skipped {}: {}", skipped.indicator, skipped.reason)?;
        }
        Ok(())
    }
}

/// Collection of validation records with JSON export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub records: Vec<ValidationRecord>,
}

impl ValidationReport {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ValidationResult>,
    {
        Self {
            records: results.into_iter().map(ValidationRecord::from).collect(),
        }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write as pretty JSON to any writer
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Write as a JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::matrix::ImpactMatrixBuilder;
    use crate::propagator::Propagator;
    use crate::types::{EventCatalog, Indicator, Observation};
    use crate::validator::validate_indicator;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn baseline_only_result() -> ValidationResult {
        let observations = [(2011, 14.0), (2015, 42.0), (2024, 49.0)]
            .iter()
            .map(|&(y, v)| Observation::new(NaiveDate::from_ymd_opt(y, 12, 31).unwrap(), v))
            .collect();
        let indicator = Indicator::new("ACC_OWNERSHIP", "Account ownership", "%", observations).unwrap();
        let catalog = EventCatalog::default();
        let matrix = ImpactMatrixBuilder::new(["ACC_OWNERSHIP"])
            .unwrap()
            .build(&[], &catalog)
            .unwrap();

        validate_indicator(
            &indicator,
            &Propagator::new(&matrix, &catalog),
            &ValidationConfig::default(),
            EffectShape::Gradual,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_line_format() {
        let result = baseline_only_result();
        assert_eq!(
            summary_line(&result),
            "ACC_OWNERSHIP | MAE 0.2800 | MAPE 57.14% | trend +0.0700/yr | poor"
        );
    }

    #[test]
    fn test_record_is_in_indicator_units() {
        let record = ValidationRecord::from(&baseline_only_result());
        assert_eq!(record.years, vec![2015, 2024]);
        assert!((record.mae - 28.0).abs() < 1e-9);
        assert!((record.trend_slope - 7.0).abs() < 1e-9);
        assert!((record.trend_intercept_value - 42.0).abs() < 1e-9);
        assert_eq!(record.status, PerformanceStatus::Poor);
    }

    #[rstest]
    #[case(0.0, PerformanceStatus::Excellent)]
    #[case(4.999, PerformanceStatus::Excellent)]
    #[case(5.0, PerformanceStatus::Good)]
    #[case(9.99, PerformanceStatus::Good)]
    #[case(10.0, PerformanceStatus::Fair)]
    #[case(19.99, PerformanceStatus::Fair)]
    #[case(20.0, PerformanceStatus::Poor)]
    #[case(250.0, PerformanceStatus::Poor)]
    fn test_status_thresholds(#[case] mape: f64, #[case] expected: PerformanceStatus) {
        assert_eq!(PerformanceStatus::from_mape(mape), expected);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(PerformanceStatus::Excellent.to_string(), "excellent");
        assert_eq!(PerformanceStatus::Good.to_string(), "good");
        assert_eq!(PerformanceStatus::Fair.to_string(), "fair");
        assert_eq!(PerformanceStatus::Poor.to_string(), "poor");
    }

    #[test]
    fn test_empty_batch_summary() {
        let summary = BatchSummary::from_outcome(&BatchOutcome::default());
        assert_eq!(summary.validated, 0);
        assert_eq!(summary.overall, None);
        assert!(summary.to_string().contains("No validation results available"));
    }
}
