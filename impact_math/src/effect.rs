//! Temporal effect function
//!
//! Maps a base value, a signed impact magnitude and the time elapsed since
//! an event's lag-adjusted onset to an adjusted value. Three shapes are
//! supported:
//! - Immediate: the full effect from the first eligible month
//! - Gradual: a linear ramp to the full effect over the ramp window
//! - Delayed: a linear rise to a peak, then exponential decay

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed month length used when converting day offsets to months
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Convert a signed day offset into fractional months
pub fn days_to_months(days: i64) -> f64 {
    days as f64 / DAYS_PER_MONTH
}

/// Temporal profile of an event's influence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectShape {
    Immediate,
    Gradual,
    Delayed,
}

impl EffectShape {
    /// Every supported shape, in declaration order
    pub const ALL: [EffectShape; 3] = [
        EffectShape::Immediate,
        EffectShape::Gradual,
        EffectShape::Delayed,
    ];

    /// The tag used for this shape in configuration and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectShape::Immediate => "immediate",
            EffectShape::Gradual => "gradual",
            EffectShape::Delayed => "delayed",
        }
    }

    /// Share of the full effect reached after `elapsed_months`.
    ///
    /// Assumes `elapsed_months >= 0`; callers handle the pre-onset case.
    pub fn fraction(&self, elapsed_months: f64, params: &EffectParams) -> f64 {
        match self {
            EffectShape::Immediate => 1.0,
            EffectShape::Gradual => (elapsed_months / params.ramp_months).min(1.0),
            EffectShape::Delayed => {
                if elapsed_months <= params.peak_months {
                    elapsed_months / params.peak_months
                } else {
                    (-params.decay_rate * (elapsed_months - params.peak_months)).exp()
                }
            }
        }
    }
}

impl fmt::Display for EffectShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectShape {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(EffectShape::Immediate),
            "gradual" => Ok(EffectShape::Gradual),
            "delayed" => Ok(EffectShape::Delayed),
            _ => Err(MathError::UnknownShape(s.to_string())),
        }
    }
}

/// Shape constants for the temporal effect function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectParams {
    /// Months for the gradual ramp to reach the full effect
    pub ramp_months: f64,
    /// Month at which the delayed shape peaks
    pub peak_months: f64,
    /// Exponential decay rate per month past the peak
    pub decay_rate: f64,
}

impl EffectParams {
    /// Create a new parameter set, rejecting non-positive windows
    pub fn new(ramp_months: f64, peak_months: f64, decay_rate: f64) -> Result<Self> {
        if !(ramp_months > 0.0) || !ramp_months.is_finite() {
            return Err(MathError::InvalidInput(
                "Ramp window must be a positive number of months".to_string(),
            ));
        }
        if !(peak_months > 0.0) || !peak_months.is_finite() {
            return Err(MathError::InvalidInput(
                "Peak month must be a positive number of months".to_string(),
            ));
        }
        if !(decay_rate >= 0.0) || !decay_rate.is_finite() {
            return Err(MathError::InvalidInput(
                "Decay rate must be a non-negative number".to_string(),
            ));
        }

        Ok(Self {
            ramp_months,
            peak_months,
            decay_rate,
        })
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            ramp_months: 12.0,
            peak_months: 6.0,
            decay_rate: 0.1,
        }
    }
}

/// Apply an event effect to `base_value` with the default shape constants.
///
/// `impact_magnitude` is signed: positive raises the value, negative lowers
/// it. When `elapsed_months` is negative the event has not started and
/// `base_value` is returned unchanged.
///
/// # Examples
///
/// ```
/// use impact_math::{apply_effect, EffectShape};
///
/// assert_eq!(apply_effect(100.0, 0.2, -1.0, EffectShape::Immediate), 100.0);
/// assert_eq!(apply_effect(200.0, 0.5, 6.0, EffectShape::Gradual), 250.0);
/// ```
pub fn apply_effect(
    base_value: f64,
    impact_magnitude: f64,
    elapsed_months: f64,
    shape: EffectShape,
) -> f64 {
    apply_effect_with(
        base_value,
        impact_magnitude,
        elapsed_months,
        shape,
        &EffectParams::default(),
    )
}

/// Apply an event effect using custom shape constants
pub fn apply_effect_with(
    base_value: f64,
    impact_magnitude: f64,
    elapsed_months: f64,
    shape: EffectShape,
    params: &EffectParams,
) -> f64 {
    if elapsed_months < 0.0 {
        return base_value;
    }

    let fraction = shape.fraction(elapsed_months, params);
    base_value * (1.0 + impact_magnitude * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(EffectShape::Immediate)]
    #[case(EffectShape::Gradual)]
    #[case(EffectShape::Delayed)]
    fn test_no_effect_before_onset(#[case] shape: EffectShape) {
        for elapsed in [-0.001, -1.0, -24.0, -1e6] {
            assert_eq!(apply_effect(0.42, 0.3, elapsed, shape), 0.42);
            assert_eq!(apply_effect(-7.5, -0.9, elapsed, shape), -7.5);
        }
    }

    #[test]
    fn test_immediate_is_constant_after_onset() {
        let expected = 50.0 * (1.0 + 0.1);
        for elapsed in [0.0, 0.5, 12.0, 240.0] {
            assert_eq!(apply_effect(50.0, 0.1, elapsed, EffectShape::Immediate), expected);
        }
    }

    #[test]
    fn test_gradual_ramp() {
        let v = 0.35;
        let m = 0.08;
        assert_eq!(apply_effect(v, m, 0.0, EffectShape::Gradual), v);
        assert_eq!(apply_effect(v, m, 6.0, EffectShape::Gradual), v * (1.0 + m * 0.5));
        assert_eq!(apply_effect(v, m, 12.0, EffectShape::Gradual), v * (1.0 + m));
        assert_eq!(apply_effect(v, m, 36.0, EffectShape::Gradual), v * (1.0 + m));
        assert_relative_eq!(
            apply_effect(v, m, 3.0, EffectShape::Gradual),
            v * (1.0 + m * 0.25),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_delayed_peak_then_decay() {
        let v = 10.0;
        let m = 0.5;
        assert_eq!(apply_effect(v, m, 6.0, EffectShape::Delayed), v * (1.0 + m));
        assert_relative_eq!(apply_effect(v, m, 3.0, EffectShape::Delayed), v * 1.25, epsilon = 1e-12);

        let after = apply_effect(v, m, 16.0, EffectShape::Delayed);
        assert_relative_eq!(after, v * (1.0 + m * (-1.0f64).exp()), epsilon = 1e-12);

        // Decays towards the base value
        let far = apply_effect(v, m, 60.0, EffectShape::Delayed);
        assert!(far > v);
        assert_relative_eq!(far - v, v * m * (-5.4f64).exp(), epsilon = 1e-12);
        assert!(far < after);

        let gone = apply_effect(v, m, 600.0, EffectShape::Delayed);
        assert!(gone >= v && gone - v < 1e-9);
    }

    #[test]
    fn test_negative_magnitude_lowers_value() {
        let v = 0.6;
        assert_relative_eq!(apply_effect(v, -0.1, 12.0, EffectShape::Gradual), 0.54, epsilon = 1e-12);
        assert!(apply_effect(v, -0.1, 1.0, EffectShape::Delayed) < v);
    }

    #[test]
    fn test_custom_params() {
        let params = EffectParams::new(24.0, 3.0, 0.5).unwrap();
        assert_eq!(
            apply_effect_with(1.0, 1.0, 12.0, EffectShape::Gradual, &params),
            1.5
        );
        assert_eq!(
            apply_effect_with(1.0, 1.0, 3.0, EffectShape::Delayed, &params),
            2.0
        );
        assert!(EffectParams::new(0.0, 6.0, 0.1).is_err());
        assert!(EffectParams::new(12.0, -1.0, 0.1).is_err());
        assert!(EffectParams::new(12.0, 6.0, f64::NAN).is_err());
    }

    #[rstest]
    #[case("immediate", EffectShape::Immediate)]
    #[case("Gradual", EffectShape::Gradual)]
    #[case("  DELAYED ", EffectShape::Delayed)]
    fn test_parse_shape(#[case] tag: &str, #[case] expected: EffectShape) {
        assert_eq!(tag.parse::<EffectShape>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_shape_fails() {
        let err = "linear".parse::<EffectShape>().unwrap_err();
        assert_eq!(err, MathError::UnknownShape("linear".to_string()));
        assert!("".parse::<EffectShape>().is_err());
    }

    #[test]
    fn test_shape_tags_round_trip() {
        for shape in EffectShape::ALL {
            assert_eq!(shape.to_string().parse::<EffectShape>().unwrap(), shape);
        }
    }

    #[test]
    fn test_days_to_months() {
        assert_eq!(days_to_months(0), 0.0);
        assert_relative_eq!(days_to_months(3044), 100.0, epsilon = 1e-9);
        assert!(days_to_months(-31) < 0.0);
    }
}
