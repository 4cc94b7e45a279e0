//! Record shapes crossing the loading boundary, and their assembly into
//! indicators, an event catalog and impact links

use crate::error::{ImpactError, Result};
use crate::types::{Direction, Event, EventCatalog, ImpactLink, Indicator, Observation};
use crate::utils::{parse_date, parse_optional_date};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One historical observation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub indicator_code: String,
    pub date: String,
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub indicator_name: Option<String>,
}

/// One event row; a blank date means the date is unknown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    pub category: String,
}

/// One impact link row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactLinkRecord {
    pub event_id: String,
    pub target_indicator: String,
    pub direction: String,
    pub magnitude: f64,
    pub lag_months: u32,
    pub confidence: String,
    #[serde(default)]
    pub basis: Option<String>,
}

/// Everything the engine consumes, assembled from records
#[derive(Debug, Clone)]
pub struct Dataset {
    pub indicators: BTreeMap<String, Indicator>,
    pub catalog: EventCatalog,
    pub links: Vec<ImpactLink>,
}

impl Dataset {
    /// Assemble a dataset, checking the invariants of every record
    pub fn from_records(
        observations: &[ObservationRecord],
        events: &[EventRecord],
        links: &[ImpactLinkRecord],
    ) -> Result<Self> {
        let indicators = build_indicators(observations)?;

        let events = events
            .iter()
            .map(|r| -> Result<Event> {
                Ok(Event::new(
                    r.event_id.clone(),
                    r.name.clone(),
                    r.category.clone(),
                    parse_optional_date(r.date.as_deref())?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let catalog = EventCatalog::new(events)?;

        let links = links
            .iter()
            .map(|r| -> Result<ImpactLink> {
                let direction: Direction = r.direction.parse()?;
                let mut link = ImpactLink::new(
                    r.event_id.clone(),
                    r.target_indicator.clone(),
                    direction,
                    r.magnitude,
                    r.lag_months,
                )?
                .with_confidence(r.confidence.clone());
                link.basis = r.basis.clone();
                Ok(link)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Loaded {} indicators, {} events, {} impact links",
            indicators.len(),
            catalog.len(),
            links.len()
        );

        Ok(Self {
            indicators,
            catalog,
            links,
        })
    }

    pub fn indicator(&self, code: &str) -> Option<&Indicator> {
        self.indicators.get(code)
    }
}

fn build_indicators(records: &[ObservationRecord]) -> Result<BTreeMap<String, Indicator>> {
    struct Pending {
        name: String,
        unit: String,
        observations: Vec<Observation>,
    }

    let mut pending: BTreeMap<String, Pending> = BTreeMap::new();

    for record in records {
        let date = parse_date(&record.date)?;
        let entry = pending
            .entry(record.indicator_code.clone())
            .or_insert_with(|| Pending {
                name: record
                    .indicator_name
                    .clone()
                    .unwrap_or_else(|| record.indicator_code.clone()),
                unit: record.unit.clone(),
                observations: Vec::new(),
            });

        if entry.unit != record.unit {
            warn!(
                "Indicator {} mixes units '{}' and '{}', keeping the first",
                record.indicator_code, entry.unit, record.unit
            );
        }
        entry.observations.push(Observation::new(date, record.value));
    }

    pending
        .into_iter()
        .map(|(code, p)| -> Result<(String, Indicator)> {
            let indicator = Indicator::new(code.clone(), p.name, p.unit, p.observations)?;
            Ok((code, indicator))
        })
        .collect()
}

/// Data loader for delimited record files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Read every row of a CSV file with headers
    pub fn read_csv<T, P>(path: P) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::read_records(file)
    }

    /// Read every row from a CSV source with headers
    pub fn read_records<T, R>(reader: R) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for row in rdr.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    pub fn observations_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ObservationRecord>> {
        Self::read_csv(path)
    }

    pub fn events_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
        Self::read_csv(path)
    }

    pub fn links_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ImpactLinkRecord>> {
        Self::read_csv(path)
    }

    /// Load and assemble a dataset from three CSV files
    pub fn load_dataset<P, Q, R>(observations: P, events: Q, links: R) -> Result<Dataset>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let observations = Self::observations_from_csv(observations)?;
        let events = Self::events_from_csv(events)?;
        let links = Self::links_from_csv(links)?;

        if observations.is_empty() {
            return Err(ImpactError::DataError(
                "No observations found in data".to_string(),
            ));
        }

        Dataset::from_records(&observations, &events, &links)
    }
}
