//! Error types for the event_impact crate

use impact_math::MathError;
use thiserror::Error;

/// Custom error types for the event_impact crate
#[derive(Debug, Error)]
pub enum ImpactError {
    /// Too few historical points to fit a baseline trend
    #[error("Insufficient data for {indicator}: need {required} {window} points, found {found}")]
    InsufficientData {
        indicator: String,
        required: usize,
        found: usize,
        window: String,
    },

    /// No evaluation year overlaps a non-zero actual observation
    #[error("Validation failed for {indicator}: no evaluation year has a usable actual observation")]
    ValidationFailed { indicator: String },

    /// An effect shape tag outside immediate/gradual/delayed was requested
    #[error("Unknown effect shape: {0}")]
    UnknownEffectShape(String),

    /// Propagation requested for an indicator the impact matrix does not track
    #[error("Indicator {0} is not a column of the impact matrix")]
    UnknownIndicatorColumn(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from a date or number that could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    Math(MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from reading or writing delimited text
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ImpactError {
    /// Whether a batch can skip the affected indicator and carry on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ImpactError::InsufficientData { .. }
                | ImpactError::ValidationFailed { .. }
                | ImpactError::UnknownIndicatorColumn(_)
        )
    }

    /// Indicator code the error refers to, when it has one
    pub fn indicator(&self) -> Option<&str> {
        match self {
            ImpactError::InsufficientData { indicator, .. }
            | ImpactError::ValidationFailed { indicator } => Some(indicator),
            ImpactError::UnknownIndicatorColumn(code) => Some(code),
            _ => None,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ImpactError>;

impl From<MathError> for ImpactError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::UnknownShape(tag) => ImpactError::UnknownEffectShape(tag),
            other => ImpactError::Math(other),
        }
    }
}

impl From<chrono::ParseError> for ImpactError {
    fn from(err: chrono::ParseError) -> Self {
        ImpactError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let insufficient = ImpactError::InsufficientData {
            indicator: "ACC_OWNERSHIP".to_string(),
            required: 3,
            found: 1,
            window: "historical".to_string(),
        };
        assert!(insufficient.is_recoverable());
        assert_eq!(insufficient.indicator(), Some("ACC_OWNERSHIP"));

        assert!(ImpactError::ValidationFailed {
            indicator: "X".to_string()
        }
        .is_recoverable());
        assert!(ImpactError::UnknownIndicatorColumn("X".to_string()).is_recoverable());
        assert!(!ImpactError::UnknownEffectShape("linear".to_string()).is_recoverable());
        assert!(!ImpactError::DataError("bad".to_string()).is_recoverable());
    }

    #[test]
    fn test_unknown_shape_conversion() {
        let err = ImpactError::from(MathError::UnknownShape("spike".to_string()));
        assert!(matches!(err, ImpactError::UnknownEffectShape(ref tag) if tag == "spike"));

        let err = ImpactError::from(MathError::InvalidInput("nope".to_string()));
        assert!(matches!(err, ImpactError::Math(_)));
    }
}
