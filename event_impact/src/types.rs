//! Core data model: indicators, events, impact links and trajectories

use crate::error::{ImpactError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single dated value of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// A tracked quantitative measure with its historical observations.
///
/// Observations are kept sorted ascending by date and dates are unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    code: String,
    name: String,
    unit: String,
    observations: Vec<Observation>,
}

impl Indicator {
    /// Create an indicator, sorting its observations by date.
    ///
    /// Fails on duplicate dates or non-finite values.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        mut observations: Vec<Observation>,
    ) -> Result<Self> {
        let code = code.into();

        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(ImpactError::DataError(format!(
                "Indicator {} has a non-finite value on {}",
                code, bad.date
            )));
        }

        observations.sort_by_key(|o| o.date);

        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ImpactError::DataError(format!(
                "Indicator {} has more than one observation on {}",
                code, pair[0].date
            )));
        }

        Ok(Self {
            code,
            name: name.into(),
            unit: unit.into(),
            observations,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Observations in ascending date order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Whether values are expressed as percentages
    pub fn is_percentage(&self) -> bool {
        is_percentage_unit(&self.unit)
    }

    /// Divisor that brings values onto the unit interval (100 for percentages)
    pub fn scale(&self) -> f64 {
        if self.is_percentage() {
            100.0
        } else {
            1.0
        }
    }
}

/// Whether a unit label denotes a percentage scale
pub fn is_percentage_unit(unit: &str) -> bool {
    matches!(
        unit.trim().to_ascii_lowercase().as_str(),
        "%" | "percent" | "percentage" | "pct"
    )
}

/// A discrete occurrence hypothesized to shift one or more indicators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Effective date; an undated event contributes no effect
    pub date: Option<NaiveDate>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            date,
        }
    }
}

/// Immutable, id-unique collection of events in load order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    events: Vec<Event>,
    index: BTreeMap<String, usize>,
}

impl EventCatalog {
    /// Build a catalog, rejecting duplicate event ids
    pub fn new(events: Vec<Event>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (pos, event) in events.iter().enumerate() {
            if index.insert(event.id.clone(), pos).is_some() {
                return Err(ImpactError::DataError(format!(
                    "Duplicate event id: {}",
                    event.id
                )));
            }
        }

        Ok(Self { events, index })
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.index.get(id).map(|&pos| &self.events[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Events in catalog order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Dated events sorted by date, ties kept in catalog order
    pub fn dated_in_order(&self) -> Vec<&Event> {
        let mut dated: Vec<&Event> = self.events.iter().filter(|e| e.date.is_some()).collect();
        dated.sort_by_key(|e| e.date);
        dated
    }
}

/// Direction of an asserted impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// Apply the direction's sign to a non-negative magnitude
    pub fn signed(&self, magnitude: f64) -> f64 {
        match self {
            Direction::Increase => magnitude,
            Direction::Decrease => -magnitude,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => f.write_str("increase"),
            Direction::Decrease => f.write_str("decrease"),
        }
    }
}

impl FromStr for Direction {
    type Err = ImpactError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Direction::Increase),
            "decrease" => Ok(Direction::Decrease),
            _ => Err(ImpactError::ParseError(format!(
                "Unknown impact direction: {}",
                s
            ))),
        }
    }
}

/// An asserted relationship from one event to one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactLink {
    pub event_id: String,
    pub indicator: String,
    pub direction: Direction,
    /// Relative effect as a fraction of the base value
    pub magnitude: f64,
    pub lag_months: u32,
    pub confidence: String,
    pub basis: Option<String>,
}

impl ImpactLink {
    /// Create a link, rejecting negative or non-finite magnitudes
    pub fn new(
        event_id: impl Into<String>,
        indicator: impl Into<String>,
        direction: Direction,
        magnitude: f64,
        lag_months: u32,
    ) -> Result<Self> {
        let event_id = event_id.into();
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(ImpactError::InvalidParameter(format!(
                "Impact magnitude for event {} must be a non-negative number, got {}",
                event_id, magnitude
            )));
        }

        Ok(Self {
            event_id,
            indicator: indicator.into(),
            direction,
            magnitude,
            lag_months,
            confidence: String::new(),
            basis: None,
        })
    }

    pub fn with_confidence(mut self, confidence: impl Into<String>) -> Self {
        self.confidence = confidence.into();
        self
    }

    pub fn with_basis(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }

    /// Magnitude with the direction's sign applied
    pub fn signed_magnitude(&self) -> f64 {
        self.direction.signed(self.magnitude)
    }
}

/// What a trajectory's values represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryKind {
    /// No event effects
    Base,
    /// Base plus propagated event effects
    Predicted,
    /// Observed values
    Actual,
}

/// A point on a trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A sequence of dated values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    kind: TrajectoryKind,
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(kind: TrajectoryKind, points: Vec<TrajectoryPoint>) -> Self {
        Self { kind, points }
    }

    /// Build a base trajectory from parallel date and value slices
    pub fn base(dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ImpactError::InvalidParameter(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }

        let points = dates
            .iter()
            .zip(values.iter())
            .map(|(&date, &value)| TrajectoryPoint { date, value })
            .collect();

        Ok(Self::new(TrajectoryKind::Base, points))
    }

    /// Observed values of an indicator
    pub fn actual(indicator: &Indicator) -> Self {
        let points = indicator
            .observations()
            .iter()
            .map(|o| TrajectoryPoint {
                date: o.date,
                value: o.value,
            })
            .collect();

        Self::new(TrajectoryKind::Actual, points)
    }

    /// Earliest point in each calendar year
    pub fn first_per_year(&self) -> BTreeMap<i32, f64> {
        let mut by_year = BTreeMap::new();
        for point in &self.points {
            by_year.entry(point.date.year()).or_insert(point.value);
        }
        by_year
    }

    pub fn kind(&self) -> TrajectoryKind {
        self.kind
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_indicator_sorts_observations() {
        let indicator = Indicator::new(
            "ACC_OWNERSHIP",
            "Account ownership",
            "%",
            vec![
                Observation::new(date(2017, 12, 31), 35.0),
                Observation::new(date(2011, 12, 31), 14.0),
                Observation::new(date(2014, 12, 31), 22.0),
            ],
        )
        .unwrap();

        let years: Vec<i32> = indicator.observations().iter().map(|o| o.year()).collect();
        assert_eq!(years, vec![2011, 2014, 2017]);
        assert_eq!(indicator.scale(), 100.0);
    }

    #[test]
    fn test_indicator_rejects_bad_observations() {
        let dup = Indicator::new(
            "X",
            "X",
            "count",
            vec![
                Observation::new(date(2020, 1, 1), 1.0),
                Observation::new(date(2020, 1, 1), 2.0),
            ],
        );
        assert!(matches!(dup, Err(ImpactError::DataError(_))));

        let nan = Indicator::new("X", "X", "count", vec![Observation::new(date(2020, 1, 1), f64::NAN)]);
        assert!(nan.is_err());
    }

    #[test]
    fn test_first_per_year() {
        let indicator = Indicator::new(
            "X",
            "X",
            "count",
            vec![
                Observation::new(date(2021, 9, 1), 9.0),
                Observation::new(date(2021, 3, 1), 3.0),
                Observation::new(date(2022, 1, 1), 1.0),
            ],
        )
        .unwrap();

        let actual = Trajectory::actual(&indicator);
        assert_eq!(actual.kind(), TrajectoryKind::Actual);
        assert_eq!(actual.values(), vec![3.0, 9.0, 1.0]);

        let firsts = actual.first_per_year();
        assert_eq!(firsts.len(), 2);
        assert_eq!(firsts.get(&2021), Some(&3.0));
        assert_eq!(firsts.get(&2022), Some(&1.0));
        assert_eq!(indicator.scale(), 1.0);
    }

    #[test]
    fn test_percentage_units() {
        for unit in ["%", "Percent", " percentage ", "PCT"] {
            assert!(is_percentage_unit(unit), "{unit}");
        }
        assert!(!is_percentage_unit("ETB"));
        assert!(!is_percentage_unit("count"));
    }

    #[test]
    fn test_catalog_order_and_duplicates() {
        let catalog = EventCatalog::new(vec![
            Event::new("E2", "Late", "policy", Some(date(2021, 5, 1))),
            Event::new("E0", "Undated", "policy", None),
            Event::new("E1", "Early", "product_launch", Some(date(2018, 5, 1))),
            Event::new("E3", "Same day as late", "policy", Some(date(2021, 5, 1))),
        ])
        .unwrap();

        let ordered: Vec<&str> = catalog.dated_in_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ordered, vec!["E1", "E2", "E3"]);
        assert_eq!(catalog.get("E0").unwrap().name, "Undated");

        let dup = EventCatalog::new(vec![
            Event::new("E1", "a", "policy", None),
            Event::new("E1", "b", "policy", None),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_direction_parsing_and_sign() {
        assert_eq!("Increase".parse::<Direction>().unwrap(), Direction::Increase);
        assert_eq!(" decrease".parse::<Direction>().unwrap(), Direction::Decrease);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Decrease.signed(0.25), -0.25);
    }

    #[test]
    fn test_link_rejects_negative_magnitude() {
        assert!(ImpactLink::new("E1", "X", Direction::Increase, -0.1, 0).is_err());
        let link = ImpactLink::new("E1", "X", Direction::Decrease, 0.1, 3)
            .unwrap()
            .with_confidence("high");
        assert_eq!(link.signed_magnitude(), -0.1);
        assert_eq!(link.confidence, "high");
    }

    #[test]
    fn test_base_trajectory_length_mismatch() {
        assert!(Trajectory::base(&[date(2020, 6, 30)], &[]).is_err());
        let t = Trajectory::base(&[date(2020, 6, 30)], &[0.5]).unwrap();
        assert_eq!(t.kind(), TrajectoryKind::Base);
        assert_eq!(t.values(), vec![0.5]);
    }
}
