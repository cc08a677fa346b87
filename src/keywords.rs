// src/keywords.rs
//! Interest keywords: validation plus an immutable, ordered keyword set.
//!
//! Every mutation (`add`, `remove`, `replace_all`) returns a new `KeywordSet`;
//! callers persist the new value themselves (see `config::store`).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum keyword length, counted in characters after trimming.
pub const MAX_KEYWORD_CHARS: usize = 50;

/// Keywords seeded when no keyword file or inline list is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "정보보안",
    "정보보호",
    "DN오토모티브",
    "DN솔루션즈",
    "물리보안",
    "출입통제",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeywordError {
    #[error("invalid keyword: {reason}")]
    InvalidKeyword { reason: InvalidReason },
    #[error("duplicate keyword: {0:?} is already registered")]
    DuplicateKeyword(String),
}

/// Why a candidate failed validation. `Display` is the user-facing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Empty,
    TooLong,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Empty => f.write_str("empty keyword not allowed"),
            InvalidReason::TooLong => {
                write!(f, "exceeds {MAX_KEYWORD_CHARS} characters")
            }
        }
    }
}

/// `replace_all` rejected one entry; nothing was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entry #{index} ({candidate:?}): {error}")]
pub struct RejectedEntry {
    pub index: usize,
    pub candidate: String,
    #[source]
    pub error: KeywordError,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Keyword(String);

impl Keyword {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim and check a candidate keyword.
pub fn validate(candidate: &str) -> Result<Keyword, KeywordError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(KeywordError::InvalidKeyword {
            reason: InvalidReason::Empty,
        });
    }
    if trimmed.chars().count() > MAX_KEYWORD_CHARS {
        return Err(KeywordError::InvalidKeyword {
            reason: InvalidReason::TooLong,
        });
    }
    Ok(Keyword(trimmed.to_string()))
}

/// Ordered, duplicate-free keyword collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet {
    items: Vec<Keyword>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        Self {
            items: DEFAULT_KEYWORDS
                .iter()
                .map(|k| Keyword((*k).to_string()))
                .collect(),
        }
    }

    /// Build a set from raw strings with the same rules as `replace_all`.
    pub fn from_candidates<I, S>(candidates: I) -> Result<Self, RejectedEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new().replace_all(candidates)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyword> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.items.iter().any(|k| k.as_str() == keyword)
    }

    pub fn as_strings(&self) -> Vec<String> {
        self.items.iter().map(|k| k.0.clone()).collect()
    }

    /// Append a validated keyword. Exact (case-sensitive) duplicates are rejected.
    pub fn add(&self, candidate: &str) -> Result<Self, KeywordError> {
        let keyword = validate(candidate)?;
        if self.items.contains(&keyword) {
            return Err(KeywordError::DuplicateKeyword(keyword.0));
        }
        let mut items = self.items.clone();
        items.push(keyword);
        Ok(Self { items })
    }

    /// Drop the first exact match; absent keywords leave the set unchanged.
    pub fn remove(&self, keyword: &str) -> Self {
        let needle = keyword.trim();
        let mut items = self.items.clone();
        if let Some(pos) = items.iter().position(|k| k.as_str() == needle) {
            items.remove(pos);
        }
        Self { items }
    }

    /// Validate every candidate and return a fresh set, or the first rejected
    /// entry. The receiver is never partially modified.
    pub fn replace_all<I, S>(&self, candidates: I) -> Result<Self, RejectedEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = Self::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            let candidate = candidate.as_ref();
            next = next.add(candidate).map_err(|error| RejectedEntry {
                index,
                candidate: candidate.to_string(),
                error,
            })?;
        }
        Ok(next)
    }
}

impl<'a> IntoIterator for &'a KeywordSet {
    type Item = &'a Keyword;
    type IntoIter = std::slice::Iter<'a, Keyword>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl TryFrom<Vec<String>> for KeywordSet {
    type Error = RejectedEntry;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_candidates(value)
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(value: KeywordSet) -> Self {
        value.items.into_iter().map(|k| k.0).collect()
    }
}
