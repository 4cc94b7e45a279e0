//! Error metrics for scoring predicted values against actual values

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

fn check_aligned(predicted: &[f64], actual: &[f64]) -> Result<()> {
    if predicted.len() != actual.len() || predicted.is_empty() {
        return Err(MathError::InvalidInput(
            "Predicted and actual values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Mean of `|predicted - actual|`
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_aligned(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).abs())
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Mean of `|predicted - actual| / |actual|`, as a percentage.
///
/// Points whose actual value is zero have no defined percentage error and are
/// left out of both the sum and the count. Fails when every actual is zero.
pub fn mean_absolute_percentage_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_aligned(predicted, actual)?;

    let errors: Vec<f64> = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(_, &a)| a != 0.0)
        .map(|(p, a)| (p - a).abs() / a.abs())
        .collect();

    if errors.is_empty() {
        return Err(MathError::CalculationError(
            "Cannot calculate MAPE: every actual value is zero".to_string(),
        ));
    }

    Ok(errors.iter().sum::<f64>() / errors.len() as f64 * 100.0)
}

/// Mean of `(predicted - actual)^2`
pub fn mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    check_aligned(predicted, actual)?;

    let sum: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();

    Ok(sum / predicted.len() as f64)
}

/// Square root of the mean squared error
pub fn root_mean_squared_error(predicted: &[f64], actual: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(predicted, actual)?.sqrt())
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the standard deviation of an empty series".to_string(),
        ));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(variance.sqrt())
}

/// Calculate accuracy metrics for predicted vs actual values
pub fn forecast_accuracy(predicted: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    Ok(ForecastAccuracy {
        mae: mean_absolute_error(predicted, actual)?,
        mse: mean_squared_error(predicted, actual)?,
        rmse: root_mean_squared_error(predicted, actual)?,
        mape: mean_absolute_percentage_error(predicted, actual)?,
    })
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = [12.0, 18.0, 33.0, 37.0, 52.0];

        assert_relative_eq!(mean_absolute_error(&predicted, &actual).unwrap(), 2.4);
        assert_relative_eq!(mean_squared_error(&predicted, &actual).unwrap(), 6.0);
        assert_relative_eq!(
            root_mean_squared_error(&predicted, &actual).unwrap(),
            6.0f64.sqrt()
        );

        // (0.2 + 0.1 + 0.1 + 0.075 + 0.04) / 5 * 100
        assert_relative_eq!(
            mean_absolute_percentage_error(&predicted, &actual).unwrap(),
            10.3,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_mape_averages_over_nonzero_actuals() {
        // The miss at the zero actual neither adds error nor dilutes the mean
        let mape = mean_absolute_percentage_error(&[10.0, 11.0], &[0.0, 10.0]).unwrap();
        assert_relative_eq!(mape, 10.0, epsilon = 1e-9);

        let mape = mean_absolute_percentage_error(&[1.0, 11.0, 18.0], &[0.0, 10.0, 20.0]).unwrap();
        assert_relative_eq!(mape, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mape_all_zero_actuals() {
        let result = mean_absolute_percentage_error(&[1.0, 2.0], &[0.0, 0.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
        assert!(forecast_accuracy(&[1.0, 2.0], &[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_metrics_reject_misaligned_input() {
        assert!(mean_absolute_error(&[], &[]).is_err());
        assert!(mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
        assert!(forecast_accuracy(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_forecast_accuracy_bundle() {
        let accuracy = forecast_accuracy(&[2.0, 4.0], &[1.0, 5.0]).unwrap();
        assert_eq!(accuracy.mae, 1.0);
        assert_eq!(accuracy.mse, 1.0);
        assert_eq!(accuracy.rmse, 1.0);
        assert_relative_eq!(accuracy.mape, 60.0, epsilon = 1e-9);
        assert!(accuracy.to_string().contains("MAPE"));
    }

    #[test]
    fn test_std_dev() {
        assert_relative_eq!(
            std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(),
            2.0
        );
        assert!(std_dev(&[]).is_err());
    }
}
