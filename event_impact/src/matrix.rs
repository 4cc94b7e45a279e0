//! Event × indicator impact matrix
//!
//! Rows are the distinct events that carry at least one impact link, in the
//! order their first link appears. Columns are a caller-supplied closed set of
//! indicator codes. A cell holds the signed magnitude (positive for increase,
//! negative for decrease) together with the lag of the link that produced it;
//! missing cells read as zero.

use crate::error::{ImpactError, Result};
use crate::types::{EventCatalog, ImpactLink};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// How to reconcile several links for the same (event, indicator) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The last link seen replaces earlier ones
    #[default]
    LastWins,
    /// The first link seen is kept
    FirstWins,
    /// Signed magnitudes are added; the last link's lag is kept
    Sum,
    /// Duplicates are a data error
    Reject,
}

/// A single matrix cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactCell {
    /// Signed relative magnitude
    pub magnitude: f64,
    /// Months between the event date and the onset of its effect
    pub lag_months: u32,
}

/// Read-only event × indicator table of signed magnitudes
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactMatrix {
    indicators: Vec<String>,
    events: Vec<String>,
    labels: BTreeMap<String, String>,
    cells: BTreeMap<String, BTreeMap<String, ImpactCell>>,
}

/// Builds an [`ImpactMatrix`] from a set of impact links
#[derive(Debug, Clone)]
pub struct ImpactMatrixBuilder {
    indicators: Vec<String>,
    policy: DuplicatePolicy,
}

impl ImpactMatrixBuilder {
    /// Create a builder for the given tracked indicator codes
    pub fn new<I, S>(indicators: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let indicators: Vec<String> = indicators.into_iter().map(Into::into).collect();

        let mut seen = BTreeSet::new();
        for code in &indicators {
            if !seen.insert(code.as_str()) {
                return Err(ImpactError::InvalidParameter(format!(
                    "Indicator {} is listed more than once",
                    code
                )));
            }
        }

        Ok(Self {
            indicators,
            policy: DuplicatePolicy::default(),
        })
    }

    /// Set the duplicate reconciliation policy
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Build the matrix. Event display names are taken from `catalog`.
    pub fn build(&self, links: &[ImpactLink], catalog: &EventCatalog) -> Result<ImpactMatrix> {
        let tracked: BTreeSet<&str> = self.indicators.iter().map(String::as_str).collect();

        let mut events: Vec<String> = Vec::new();
        let mut cells: BTreeMap<String, BTreeMap<String, ImpactCell>> = BTreeMap::new();

        for link in links {
            if !catalog.contains(&link.event_id) {
                warn!(
                    "Impact link references event {} which is not in the catalog",
                    link.event_id
                );
            }

            let row = cells.entry(link.event_id.clone()).or_insert_with(|| {
                events.push(link.event_id.clone());
                BTreeMap::new()
            });

            if !tracked.contains(link.indicator.as_str()) {
                warn!(
                    "Impact link {} -> {} targets an untracked indicator, ignoring",
                    link.event_id, link.indicator
                );
                continue;
            }

            let incoming = ImpactCell {
                magnitude: link.signed_magnitude(),
                lag_months: link.lag_months,
            };

            match row.entry(link.indicator.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    warn!(
                        "Duplicate impact link {} -> {}, reconciling with {:?}",
                        link.event_id, link.indicator, self.policy
                    );
                    match self.policy {
                        DuplicatePolicy::LastWins => *existing = incoming,
                        DuplicatePolicy::FirstWins => {}
                        DuplicatePolicy::Sum => {
                            existing.magnitude += incoming.magnitude;
                            existing.lag_months = incoming.lag_months;
                        }
                        DuplicatePolicy::Reject => {
                            return Err(ImpactError::DataError(format!(
                                "Duplicate impact link for event {} and indicator {}",
                                link.event_id, link.indicator
                            )));
                        }
                    }
                }
            }
        }

        let labels = events
            .iter()
            .map(|id| {
                let label = catalog
                    .get(id)
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| id.clone());
                (id.clone(), label)
            })
            .collect();

        info!(
            "Built impact matrix with {} events and {} indicators",
            events.len(),
            self.indicators.len()
        );

        Ok(ImpactMatrix {
            indicators: self.indicators.clone(),
            events,
            labels,
            cells,
        })
    }
}

impl ImpactMatrix {
    /// Tracked indicator codes, in column order
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Event ids, in row order
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.events.len(), self.indicators.len())
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn has_indicator(&self, code: &str) -> bool {
        self.indicators.iter().any(|c| c == code)
    }

    pub fn has_event(&self, event_id: &str) -> bool {
        self.cells.contains_key(event_id)
    }

    /// Row label for an event: its display name, or its id when unnamed
    pub fn label(&self, event_id: &str) -> Option<&str> {
        self.labels.get(event_id).map(String::as_str)
    }

    /// The cell for (event, indicator), if a link produced one
    pub fn cell(&self, event_id: &str, indicator: &str) -> Option<&ImpactCell> {
        self.cells.get(event_id).and_then(|row| row.get(indicator))
    }

    /// Signed magnitude for (event, indicator), zero when there is no link
    pub fn magnitude(&self, event_id: &str, indicator: &str) -> f64 {
        self.cell(event_id, indicator)
            .map(|c| c.magnitude)
            .unwrap_or(0.0)
    }

    /// One row of magnitudes in column order
    pub fn row(&self, event_id: &str) -> Option<Vec<f64>> {
        self.cells.get(event_id).map(|row| {
            self.indicators
                .iter()
                .map(|code| row.get(code).map(|c| c.magnitude).unwrap_or(0.0))
                .collect()
        })
    }

    /// Events with a non-zero cell for `indicator`, in row order
    pub fn events_affecting(&self, indicator: &str) -> Vec<&str> {
        self.events
            .iter()
            .filter(|id| self.magnitude(id, indicator) != 0.0)
            .map(String::as_str)
            .collect()
    }

    /// Write the matrix as delimited text.
    ///
    /// Header: `event_name` followed by the indicator codes. One row per
    /// event, labelled with the event's display name.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.indicators.len() + 1);
        header.push("event_name".to_string());
        header.extend(self.indicators.iter().cloned());
        wtr.write_record(&header)?;

        for event_id in &self.events {
            let mut record = Vec::with_capacity(self.indicators.len() + 1);
            record.push(self.label(event_id).unwrap_or(event_id.as_str()).to_string());
            for code in &self.indicators {
                record.push(self.magnitude(event_id, code).to_string());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write the matrix as a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_csv_writer(file)
    }
}
