// src/notify/mod.rs
//! Delivery sinks for rendered digests. The core stops at `RenderedDigest`;
//! everything after (transport, credentials, retries) belongs to a sink.

pub mod email;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::sync::Mutex;
use thiserror::Error;

use crate::digest::RenderedDigest;

pub use email::EmailSink;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("invalid recipient address {0:?}")]
    InvalidAddress(String),
    #[error("building message: {0}")]
    Build(String),
    #[error("transport: {0}")]
    Transport(String),
}

#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, rendered: &RenderedDigest, recipient: &str)
        -> Result<(), DeliveryError>;

    fn name(&self) -> &'static str;
}

/// Loose `local@domain.tld` shape check for user-entered addresses.
pub fn is_valid_email(addr: &str) -> bool {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"))
        .is_match(addr)
}

/// Short stable tag for an address, so logs never carry the address itself.
pub fn recipient_tag(addr: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(addr.trim().to_ascii_lowercase().as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// Logs instead of sending; used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl DeliverySink for LogSink {
    async fn deliver(
        &self,
        rendered: &RenderedDigest,
        recipient: &str,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            recipient = %recipient_tag(recipient),
            subject = %rendered.subject,
            bytes = rendered.body.len(),
            "digest delivery skipped (log sink)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

// --- Test helper ---
#[derive(Debug, Default)]
pub struct MemorySink {
    pub delivered: Mutex<Vec<(String, RenderedDigest)>>,
    fail_with: Option<DeliveryError>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery fails with `err`.
    pub fn failing(err: DeliveryError) -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail_with: Some(err),
        }
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().map(|v| v.len()).unwrap_or_default()
    }
}

#[async_trait]
impl DeliverySink for MemorySink {
    async fn deliver(
        &self,
        rendered: &RenderedDigest,
        recipient: &str,
    ) -> Result<(), DeliveryError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.delivered
            .lock()
            .map_err(|_| DeliveryError::Transport("memory sink poisoned".into()))?
            .push((recipient.to_string(), rendered.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
