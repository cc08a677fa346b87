// src/digest/mod.rs
//! Structured digest: ranked items, per-keyword groups, and run metadata.
//! Rendering lives in `render` and never feeds back into composition.

pub mod render;
pub mod report;
pub mod sample;

pub use render::{render, OutputFormat, RenderedDigest};
pub use report::{FetchReport, SourceReport};

use chrono::{DateTime, Utc};

use crate::analyze::CanonicalItem;
use crate::ingest::{FeedSource, FetchError};
use crate::keywords::{Keyword, KeywordSet};

pub const DEFAULT_PER_CATEGORY: usize = 5;

/// Items of one keyword, capped for display.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordGroup {
    pub keyword: Keyword,
    pub items: Vec<CanonicalItem>,
    /// Matching items before the per-category cap.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    /// Ranked, truncated, uncapped.
    pub items: Vec<CanonicalItem>,
    pub groups: Vec<KeywordGroup>,
    pub keywords: KeywordSet,
    pub report: FetchReport,
}

impl Digest {
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn failed_sources(&self) -> Vec<(&FeedSource, &FetchError)> {
        self.report.failures().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DigestComposer {
    per_category: usize,
}

impl Default for DigestComposer {
    fn default() -> Self {
        Self {
            per_category: DEFAULT_PER_CATEGORY,
        }
    }
}

impl DigestComposer {
    pub fn new(per_category: usize) -> Self {
        Self { per_category }
    }

    pub fn compose(
        &self,
        items: Vec<CanonicalItem>,
        keywords: &KeywordSet,
        report: FetchReport,
    ) -> Digest {
        self.compose_at(items, keywords, report, Utc::now())
    }

    /// Groups follow keyword-set order; keywords without items get no group.
    pub fn compose_at(
        &self,
        items: Vec<CanonicalItem>,
        keywords: &KeywordSet,
        report: FetchReport,
        generated_at: DateTime<Utc>,
    ) -> Digest {
        let groups = keywords
            .iter()
            .filter_map(|keyword| {
                let matching: Vec<&CanonicalItem> =
                    items.iter().filter(|it| it.has_keyword(keyword)).collect();
                if matching.is_empty() {
                    return None;
                }
                Some(KeywordGroup {
                    keyword: keyword.clone(),
                    total: matching.len(),
                    items: matching
                        .into_iter()
                        .take(self.per_category)
                        .cloned()
                        .collect(),
                })
            })
            .collect();

        Digest {
            generated_at,
            items,
            groups,
            keywords: keywords.clone(),
            report,
        }
    }
}
