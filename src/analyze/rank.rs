// src/analyze/rank.rs
use crate::analyze::dedup::CanonicalItem;

pub const DEFAULT_DIGEST_LIMIT: usize = 20;

/// Newest first (stable for equal timestamps), at most `limit` items.
pub fn rank(mut items: Vec<CanonicalItem>, limit: usize) -> Vec<CanonicalItem> {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(limit);
    items
}
