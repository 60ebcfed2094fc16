//! Aggregation of stored reactions
//!
//! Reads every stored channel payload and folds the reactions into per-emoji totals
//! keyed by normalized name. Totals are independent of read order; only the row
//! order of the report follows the order in which names are first seen.

use crate::resume::{EntityStore, ResumeError};
use std::collections::HashMap;
use tracing::info;

pub mod csv;

pub use self::csv::{write_custom_emoji, write_report};

/// Report errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Stored payloads could not be read
    #[error("storage error: {0}")]
    ResumeError(#[from] ResumeError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Reaction totals keyed by normalized name, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTotal {
    entries: Vec<(String, u64)>,
    positions: HashMap<String, usize>,
}

impl AggregateTotal {
    /// Empty totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to `name`, creating the entry at zero on first sight
    pub fn add(&mut self, name: &str, count: u64) {
        let idx = match self.positions.get(name) {
            Some(&idx) => idx,
            None => {
                self.entries.push((name.to_string(), 0));
                self.positions.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[idx].1 += count;
    }

    /// Total for `name`, if seen
    pub fn get(&self, name: &str) -> Option<u64> {
        self.positions.get(name).map(|&idx| self.entries[idx].1)
    }

    /// Totals in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been counted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold every stored payload into totals keyed by normalized reaction name
pub fn aggregate<S: EntityStore + ?Sized>(store: &S) -> ReportResult<AggregateTotal> {
    let mut total = AggregateTotal::new();
    let mut channels = 0usize;

    for stored in store.read_all()? {
        let (_, payload) = stored?;
        for record in &payload {
            total.add(record.normalized_name(), record.count);
        }
        channels += 1;
    }

    info!(
        channels = channels,
        distinct_reactions = total.len(),
        "Aggregated stored reactions"
    );
    Ok(total)
}
