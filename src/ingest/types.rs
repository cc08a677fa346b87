// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A configured feed endpoint. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedSource {
    url: String,
    name: String,
}

impl FeedSource {
    /// Source with a name derived from the URL host.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = source_name_from_url(&url);
        Self { url, name }
    }

    pub fn named(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Host without a leading `www.`, or `unknown source` when the URL does not parse.
pub fn source_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown source".to_string())
}

/// One parsed entry of a feed, before any keyword filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeedItem {
    pub title: String,
    /// Plain-text excerpt (markup stripped).
    pub snippet: String,
    /// Full content as delivered; may contain markup.
    pub body: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub source: FeedSource,
}

impl RawFeedItem {
    /// Publish time, or retrieval time when the feed gave none.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.fetched_at)
    }

    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.snippet.is_empty() || !self.body.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("malformed feed: {0}")]
    Malformed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of a single source. Never aborts sibling fetches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetching {feed} failed: {cause}")]
pub struct FetchError {
    pub feed: String,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(source: &FeedSource, cause: FetchCause) -> Self {
        Self {
            feed: source.url().to_string(),
            cause,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FetchCause::Timeout(_))
    }
}

/// Raw document retrieval. Implementations must not retry.
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchCause>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_derivation() {
        assert_eq!(
            FeedSource::new("https://www.boannews.com/rss/total.xml").name(),
            "boannews.com"
        );
        assert_eq!(FeedSource::new("https://rss.donga.com/total.xml").name(), "rss.donga.com");
        assert_eq!(FeedSource::new("not a url").name(), "unknown source");
        assert_eq!(FeedSource::named("https://x.test/", "X").name(), "X");
    }
}
