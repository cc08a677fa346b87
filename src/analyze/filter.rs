// src/analyze/filter.rs
//! Keyword matching: literal, case-sensitive substring search over title,
//! snippet and body.

use serde::Serialize;

use crate::ingest::RawFeedItem;
use crate::keywords::{Keyword, KeywordSet};

/// A raw item that hit at least one keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedItem {
    item: RawFeedItem,
    keywords: Vec<Keyword>,
}

impl MatchedItem {
    /// `None` when `keywords` is empty.
    pub fn new(item: RawFeedItem, keywords: Vec<Keyword>) -> Option<Self> {
        if keywords.is_empty() {
            None
        } else {
            Some(Self { item, keywords })
        }
    }

    pub fn item(&self) -> &RawFeedItem {
        &self.item
    }

    /// Matched keywords in keyword-set order.
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn into_parts(self) -> (RawFeedItem, Vec<Keyword>) {
        (self.item, self.keywords)
    }
}

/// Keywords of `keywords` found in any text field of `item`.
pub fn matching_keywords(item: &RawFeedItem, keywords: &KeywordSet) -> Vec<Keyword> {
    if !item.has_content() {
        return Vec::new();
    }
    let fields = [item.title.as_str(), item.snippet.as_str(), item.body.as_str()];
    keywords
        .iter()
        .filter(|k| fields.iter().any(|f| f.contains(k.as_str())))
        .cloned()
        .collect()
}

/// Keep items with one or more keyword hits, preserving input order.
pub fn filter(items: Vec<RawFeedItem>, keywords: &KeywordSet) -> Vec<MatchedItem> {
    items
        .into_iter()
        .filter_map(|item| {
            let hits = matching_keywords(&item, keywords);
            MatchedItem::new(item, hits)
        })
        .collect()
}
