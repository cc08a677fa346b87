// src/ingest/fetcher.rs
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::ingest::parser::parse_feed;
use crate::ingest::types::{FeedSource, FeedTransport, FetchCause, FetchError, RawFeedItem};

/// Fetches and parses exactly one source per call.
#[derive(Clone)]
pub struct FeedFetcher {
    transport: Arc<dyn FeedTransport>,
}

impl FeedFetcher {
    pub fn new(transport: Arc<dyn FeedTransport>) -> Self {
        Self { transport }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Retrieve `source` within `timeout`. The deadline covers transport and
    /// body read; parsing happens after it.
    pub async fn fetch(
        &self,
        source: &FeedSource,
        timeout: Duration,
    ) -> Result<Vec<RawFeedItem>, FetchError> {
        let body = match tokio::time::timeout(timeout, self.transport.get(source.url(), timeout)).await
        {
            Ok(Ok(body)) => body,
            Ok(Err(cause)) => return Err(FetchError::new(source, cause)),
            Err(_elapsed) => return Err(FetchError::new(source, FetchCause::Timeout(timeout))),
        };

        parse_feed(&body, source, Utc::now()).map_err(|cause| FetchError::new(source, cause))
    }
}
