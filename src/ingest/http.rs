// src/ingest/http.rs
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::types::{FeedTransport, FetchCause};

pub const DEFAULT_USER_AGENT: &str = concat!("news-clipper/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed transport. One shared client, no retries.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| anyhow::anyhow!("building http client: {e}"))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchCause> {
        tracing::debug!(%url, "fetching feed");
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchCause::Timeout(timeout)
                } else {
                    FetchCause::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchCause::Status(status.as_u16()));
        }

        resp.text()
            .await
            .map_err(|e| FetchCause::Transport(format!("reading body: {e}")))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
