//! Utility functions for the event_impact crate

use crate::error::{ImpactError, Result};
use chrono::NaiveDate;
use impact_math::effect::days_to_months;

/// Date format used across records and reports
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| ImpactError::ParseError(format!("Invalid date '{}': {}", s, e)))
}

/// Parse an optional date; blank input means absent
pub fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text).map(Some),
    }
}

/// Months from `since` to `date`, using the fixed 30.44-day month.
///
/// Negative when `date` is before `since`.
pub fn months_between(date: NaiveDate, since: NaiveDate) -> f64 {
    days_to_months((date - since).num_days())
}

/// A fixed calendar point inside `year`
pub fn date_in_year(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ImpactError::InvalidParameter(format!("Invalid date {}-{:02}-{:02}", year, month, day))
    })
}

/// One date per year in `start..=end` at the same month and day
pub fn yearly_dates(start: i32, end: i32, month: u32, day: u32) -> Result<Vec<NaiveDate>> {
    (start..=end)
        .map(|year| date_in_year(year, month, day))
        .collect()
}
