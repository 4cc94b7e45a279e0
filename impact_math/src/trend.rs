//! Linear trend fitting for baseline projections
//!
//! Contains two fitting methods:
//! - Two-point: the line through the first and last observation
//! - Least squares: ordinary least squares over every observation

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// How a baseline trend is fitted to a set of points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMethod {
    /// Two-point when exactly two points are available, least squares otherwise
    #[default]
    Auto,
    /// Line through the first and last point
    TwoPoint,
    /// Ordinary least squares over all points
    LeastSquares,
}

/// A straight line expressed relative to an anchor position.
///
/// `value_at(x) = intercept + slope * (x - anchor)`, so `intercept` is the
/// line's value at `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    slope: f64,
    intercept: f64,
    anchor: f64,
}

impl LinearTrend {
    /// Create a trend from its slope and its value at `anchor`
    pub fn new(slope: f64, intercept: f64, anchor: f64) -> Self {
        Self {
            slope,
            intercept,
            anchor,
        }
    }

    /// Fit a trend with the requested method
    pub fn fit(xs: &[f64], ys: &[f64], method: TrendMethod) -> Result<Self> {
        match method {
            TrendMethod::TwoPoint => Self::two_point(xs, ys),
            TrendMethod::LeastSquares => Self::least_squares(xs, ys),
            TrendMethod::Auto if xs.len() == 2 => Self::two_point(xs, ys),
            TrendMethod::Auto => Self::least_squares(xs, ys),
        }
    }

    /// Line through the first and last point, anchored at the last point
    pub fn two_point(xs: &[f64], ys: &[f64]) -> Result<Self> {
        check_inputs(xs, ys)?;

        let (x0, y0) = (xs[0], ys[0]);
        let (x1, y1) = (xs[xs.len() - 1], ys[ys.len() - 1]);

        if (x1 - x0).abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: first and last x values coincide".to_string(),
            ));
        }

        Ok(Self {
            slope: (y1 - y0) / (x1 - x0),
            intercept: y1,
            anchor: x1,
        })
    }

    /// Ordinary least squares fit, anchored at the last point
    pub fn least_squares(xs: &[f64], ys: &[f64]) -> Result<Self> {
        check_inputs(xs, ys)?;

        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for (&x, &y) in xs.iter().zip(ys.iter()) {
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let anchor = xs[xs.len() - 1];

        Ok(Self {
            slope,
            intercept: y_mean + slope * (anchor - x_mean),
            anchor,
        })
    }

    /// Change per unit of x
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Value of the line at its anchor
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Position the intercept refers to
    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    /// Value of the line at x = 0
    pub fn intercept_at_origin(&self) -> f64 {
        self.value_at(0.0)
    }

    /// Evaluate the line at `x`
    pub fn value_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * (x - self.anchor)
    }

    /// The same line with its intercept expressed at a new anchor
    pub fn reanchored(&self, anchor: f64) -> Self {
        Self {
            slope: self.slope,
            intercept: self.value_at(anchor),
            anchor,
        }
    }

    /// Multiply the slope, pivoting on the current anchor
    pub fn with_slope_multiplier(&self, multiplier: f64) -> Self {
        Self {
            slope: self.slope * multiplier,
            intercept: self.intercept,
            anchor: self.anchor,
        }
    }

    /// Multiply both slope and intercept, e.g. to convert between units
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            slope: self.slope * factor,
            intercept: self.intercept * factor,
            anchor: self.anchor,
        }
    }

    /// Observed minus fitted value for each point
    pub fn residuals(&self, xs: &[f64], ys: &[f64]) -> Result<Vec<f64>> {
        if xs.len() != ys.len() {
            return Err(MathError::InvalidInput(format!(
                "x length ({}) doesn't match y length ({})",
                xs.len(),
                ys.len()
            )));
        }

        Ok(xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| y - self.value_at(x))
            .collect())
    }

    /// Get the R-squared value (coefficient of determination)
    pub fn r_squared(&self, xs: &[f64], ys: &[f64]) -> Result<f64> {
        check_inputs(xs, ys)?;

        let y_mean = ys.iter().sum::<f64>() / ys.len() as f64;

        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;

        for (&x, &y) in xs.iter().zip(ys.iter()) {
            ss_total += (y - y_mean).powi(2);
            ss_residual += (y - self.value_at(x)).powi(2);
        }

        if ss_total.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate R-squared: total sum of squares is too small".to_string(),
            ));
        }

        Ok(1.0 - (ss_residual / ss_total))
    }
}

fn check_inputs(xs: &[f64], ys: &[f64]) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(MathError::InvalidInput(format!(
            "x length ({}) doesn't match y length ({})",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 2 points to fit a trend, got {}",
            xs.len()
        )));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Trend inputs must be finite".to_string(),
        ));
    }
    Ok(())
}
