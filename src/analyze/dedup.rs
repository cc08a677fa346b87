// src/analyze/dedup.rs
//! Cross-source deduplication.
//!
//! Two items are the same story when their titles agree after lower-casing and
//! removing all whitespace. Items without a usable title fall back to their
//! link; items with neither are never merged. One pass, hash lookup per item.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::analyze::filter::MatchedItem;
use crate::ingest::summarize;
use crate::keywords::Keyword;

/// Representative of one or more duplicate matched items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Source of the first-seen member.
    pub source: String,
    /// Distinct source names that carried the story, first-seen order.
    pub sources: Vec<String>,
    /// Union of matched keywords, first-seen order.
    pub keywords: Vec<Keyword>,
    /// Most recent timestamp among the members.
    pub published_at: DateTime<Utc>,
}

impl CanonicalItem {
    pub fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.contains(keyword)
    }

    fn absorb(&mut self, other: CanonicalItem) {
        for k in other.keywords {
            if !self.keywords.contains(&k) {
                self.keywords.push(k);
            }
        }
        for s in other.sources {
            if !self.sources.contains(&s) {
                self.sources.push(s);
            }
        }
        if other.published_at > self.published_at {
            self.published_at = other.published_at;
        }
    }
}

impl From<MatchedItem> for CanonicalItem {
    fn from(m: MatchedItem) -> Self {
        let (item, keywords) = m.into_parts();
        let published_at = item.timestamp();
        let summary = if item.snippet.is_empty() {
            summarize(&item.body)
        } else {
            summarize(&item.snippet)
        };
        let source = item.source.name().to_string();
        Self {
            title: item.title,
            link: item.link,
            summary,
            sources: vec![source.clone()],
            source,
            keywords,
            published_at,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum DedupKey {
    Title(String),
    Link(String),
}

/// Lower-cased title with every whitespace character removed.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn dedup_key(item: &CanonicalItem) -> Option<DedupKey> {
    let title = normalize_title(&item.title);
    if !title.is_empty() {
        return Some(DedupKey::Title(title));
    }
    let link = item.link.trim();
    if !link.is_empty() {
        return Some(DedupKey::Link(link.to_string()));
    }
    None
}

/// Collapse duplicates; output keeps the order in which each story was first seen.
///
/// Accepts matched items or already-canonical items, so the stage can be
/// re-applied to its own output without change.
pub fn dedupe<I>(items: I) -> Vec<CanonicalItem>
where
    I: IntoIterator,
    I::Item: Into<CanonicalItem>,
{
    let mut out: Vec<CanonicalItem> = Vec::new();
    let mut index: HashMap<DedupKey, usize> = HashMap::new();

    for item in items {
        let item: CanonicalItem = item.into();
        match dedup_key(&item) {
            Some(key) => match index.get(&key) {
                Some(&pos) => out[pos].absorb(item),
                None => {
                    index.insert(key, out.len());
                    out.push(item);
                }
            },
            None => out.push(item),
        }
    }

    out
}
