// src/digest/report.rs
use crate::ingest::{FeedSource, FetchError};

/// Outcome of one source in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: FeedSource,
    /// Number of parsed items, or why the source failed.
    pub outcome: Result<usize, FetchError>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-source outcomes in configured source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub entries: Vec<SourceReport>,
}

impl FetchReport {
    pub fn new(entries: Vec<SourceReport>) -> Self {
        Self { entries }
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FeedSource, &FetchError)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            Err(err) => Some((&e.source, err)),
            Ok(_) => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// Total items parsed across successful sources.
    pub fn items_fetched(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok())
            .sum()
    }
}
