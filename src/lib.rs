// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod keywords;

// Fetch → filter → dedup → rank → compose
pub mod analyze;
pub mod digest;
pub mod ingest;
pub mod pipeline;

pub mod config;
pub mod runner;

// Delivery and HTTP surface
pub mod api;
pub mod notify;

pub mod metrics;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, ApiState};
pub use crate::config::{FileSettingsProvider, RunSettings, Settings, SettingsProvider};
pub use crate::digest::{render, Digest, DigestComposer, OutputFormat, RenderedDigest};
pub use crate::keywords::{Keyword, KeywordError, KeywordSet};
pub use crate::pipeline::{Pipeline, PipelineOptions};
pub use crate::runner::{DeliveryStatus, RunError, RunOutcome, Runner};
