// src/ingest/fixture.rs
//! In-memory transport serving canned documents; used by tests and dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::ingest::types::{FeedTransport, FetchCause};

#[derive(Debug, Clone)]
pub enum Fixture {
    Body(String),
    /// Respond after a delay.
    Delayed(Duration, String),
    Fail(FetchCause),
    /// Never respond.
    Hang,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureTransport {
    routes: HashMap<String, Fixture>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, fixture: Fixture) -> Self {
        self.routes.insert(url.into(), fixture);
        self
    }

    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with(url, Fixture::Body(body.into()))
    }
}

#[async_trait]
impl FeedTransport for FixtureTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<String, FetchCause> {
        match self.routes.get(url) {
            Some(Fixture::Body(s)) => Ok(s.clone()),
            Some(Fixture::Delayed(d, s)) => {
                tokio::time::sleep(*d).await;
                Ok(s.clone())
            }
            Some(Fixture::Fail(cause)) => Err(cause.clone()),
            Some(Fixture::Hang) => std::future::pending().await,
            None => Err(FetchCause::Status(404)),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
