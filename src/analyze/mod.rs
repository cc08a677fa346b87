// src/analyze/mod.rs
//! Pure post-fetch stages: keyword filter → dedup → rank.

pub mod dedup;
pub mod filter;
pub mod rank;

pub use dedup::{dedupe, CanonicalItem};
pub use filter::{filter, MatchedItem};
pub use rank::{rank, DEFAULT_DIGEST_LIMIT};
