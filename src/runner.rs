// src/runner.rs
//! Scheduler entry point: settings → pipeline → render → deliver.
//!
//! A run fails only when it cannot start (configuration). Fetch failures and
//! delivery failures are reported in the outcome next to the digest.

use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, RunSettings, SettingsProvider};
use crate::digest::{render, Digest, OutputFormat, RenderedDigest};
use crate::ingest::http::HttpTransport;
use crate::ingest::{FeedFetcher, FeedTransport};
use crate::notify::{recipient_tag, DeliveryError, DeliverySink};
use crate::pipeline::Pipeline;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("rendering digest: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    Delivered { recipient: String },
    /// No sink configured (dry run).
    Skipped,
    Failed {
        recipient: String,
        error: DeliveryError,
    },
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub digest: Digest,
    pub rendered: RenderedDigest,
    pub delivery: DeliveryStatus,
}

impl RunOutcome {
    pub fn delivered(&self) -> bool {
        matches!(self.delivery, DeliveryStatus::Delivered { .. })
    }
}

pub struct Runner {
    provider: Arc<dyn SettingsProvider>,
    transport: Option<Arc<dyn FeedTransport>>,
    sink: Option<Arc<dyn DeliverySink>>,
    format: Option<OutputFormat>,
}

impl Runner {
    pub fn new(provider: Arc<dyn SettingsProvider>) -> Self {
        Self {
            provider,
            transport: None,
            sink: None,
            format: None,
        }
    }

    /// Defaults to an HTTP transport built from the fetch settings.
    pub fn with_transport(mut self, transport: Arc<dyn FeedTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Overrides `[digest] format`.
    pub fn with_format(mut self, format: Option<OutputFormat>) -> Self {
        self.format = format;
        self
    }

    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let RunSettings { settings, keywords } = self.provider.load()?;

        let recipient = match &self.sink {
            Some(_) => Some(
                settings
                    .recipient()
                    .ok_or(ConfigError::MissingRecipient)?
                    .to_string(),
            ),
            None => None,
        };

        let transport: Arc<dyn FeedTransport> = match &self.transport {
            Some(t) => Arc::clone(t),
            None => Arc::new(
                HttpTransport::new(&settings.fetch.user_agent)
                    .map_err(|e| ConfigError::Invalid(format!("{e:#}")))?,
            ),
        };

        let fetcher = FeedFetcher::new(transport);
        let transport_name = fetcher.transport_name();
        let pipeline = Pipeline::new(fetcher, settings.feed_sources(), settings.pipeline_options());
        tracing::info!(
            transport = transport_name,
            keywords = ?keywords.as_strings(),
            sources = pipeline.sources().len(),
            max_in_flight = pipeline.options().max_in_flight,
            "digest run started"
        );

        let digest = pipeline.run(&keywords).await;
        let format = self.format.unwrap_or(settings.digest.format);
        let rendered = render(&digest, format)?;

        let delivery = match (&self.sink, recipient) {
            (Some(sink), Some(recipient)) => match sink.deliver(&rendered, &recipient).await {
                Ok(()) => DeliveryStatus::Delivered { recipient },
                Err(error) => {
                    tracing::error!(
                        sink = sink.name(),
                        recipient = %recipient_tag(&recipient),
                        %error,
                        "digest delivery failed"
                    );
                    DeliveryStatus::Failed { recipient, error }
                }
            },
            _ => DeliveryStatus::Skipped,
        };

        tracing::info!(
            items = digest.total_items(),
            failed_sources = digest.report.failed(),
            delivered = matches!(delivery, DeliveryStatus::Delivered { .. }),
            "digest run finished"
        );

        Ok(RunOutcome {
            digest,
            rendered,
            delivery,
        })
    }
}
