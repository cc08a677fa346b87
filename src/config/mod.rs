// src/config/mod.rs
//! Run settings: TOML file + env overrides, and the keyword list that goes with them.
//!
//! Lookup order for the settings file:
//! 1) $CLIPPER_CONFIG_PATH
//! 2) config/clipper.toml
//!
//! The keyword list comes from the keyword store file when present, else the
//! inline `keywords` array, else the built-in defaults.

pub mod store;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::analyze::DEFAULT_DIGEST_LIMIT;
use crate::config::store::{JsonFileStore, KeywordStore};
use crate::digest::{OutputFormat, DEFAULT_PER_CATEGORY};
use crate::ingest::http::DEFAULT_USER_AGENT;
use crate::ingest::FeedSource;
use crate::keywords::{KeywordSet, RejectedEntry};
use crate::pipeline::{PipelineOptions, DEFAULT_MAX_IN_FLIGHT};

pub const ENV_CONFIG_PATH: &str = "CLIPPER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/clipper.toml";
pub const DEFAULT_KEYWORDS_PATH: &str = "config/keywords.json";
/// Overrides `[delivery] to`.
pub const ENV_RECIPIENT: &str = "TO_EMAIL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading settings from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing settings from {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid settings: {0}")]
    Invalid(String),
    #[error("configured keywords rejected: {0}")]
    Keywords(#[from] RejectedEntry),
    #[error("keyword store unreadable: {0}")]
    KeywordStore(String),
    #[error("no digest recipient configured (set [delivery] to or $TO_EMAIL)")]
    MissingRecipient,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_limit() -> usize {
    DEFAULT_DIGEST_LIMIT
}
fn default_per_category() -> usize {
    DEFAULT_PER_CATEGORY
}
fn default_keywords_path() -> PathBuf {
    PathBuf::from(DEFAULT_KEYWORDS_PATH)
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceCfg {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SourceCfg {
    pub fn to_source(&self) -> FeedSource {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => FeedSource::named(self.url.trim(), name),
            _ => FeedSource::new(self.url.trim()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FetchCfg {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_in_flight: default_max_in_flight(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DigestCfg {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_per_category")]
    pub per_category: usize,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for DigestCfg {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            per_category: default_per_category(),
            format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DeliveryCfg {
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub sources: Vec<SourceCfg>,
    #[serde(default)]
    pub fetch: FetchCfg,
    #[serde(default)]
    pub digest: DigestCfg,
    #[serde(default)]
    pub delivery: DeliveryCfg,
    #[serde(default = "default_keywords_path")]
    pub keywords_path: PathBuf,
    /// Used only when the keyword store file does not exist.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

impl Settings {
    pub fn from_toml_str(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(s).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("at least one [[sources]] entry is required".into()));
        }
        for s in &self.sources {
            let ok = reqwest::Url::parse(s.url.trim())
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !ok {
                return Err(ConfigError::Invalid(format!(
                    "source url {:?} is not an http(s) URL",
                    s.url
                )));
            }
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn feed_sources(&self) -> Vec<FeedSource> {
        self.sources.iter().map(SourceCfg::to_source).collect()
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            fetch_timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_in_flight: self.fetch.max_in_flight.max(1),
            digest_limit: self.digest.limit,
            per_category: self.digest.per_category,
        }
    }

    /// Configured recipient, trimmed; empty counts as missing.
    pub fn recipient(&self) -> Option<&str> {
        self.delivery
            .to
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Keywords from the store, else the inline list, else defaults.
    pub fn resolve_keywords(&self, store: &dyn KeywordStore) -> Result<KeywordSet, ConfigError> {
        if let Some(set) = store
            .load()
            .map_err(|e| ConfigError::KeywordStore(format!("{e:#}")))?
        {
            return Ok(set);
        }
        match &self.keywords {
            Some(list) => Ok(KeywordSet::from_candidates(list)?),
            None => Ok(KeywordSet::defaults()),
        }
    }
}

/// Everything a run needs from configuration, read once at run start.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub settings: Settings,
    pub keywords: KeywordSet,
}

pub trait SettingsProvider: Send + Sync {
    fn load(&self) -> Result<RunSettings, ConfigError>;
}

/// Settings file on disk plus the keyword store it points to.
#[derive(Debug, Clone)]
pub struct FileSettingsProvider {
    path: PathBuf,
}

impl FileSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// $CLIPPER_CONFIG_PATH, falling back to `config/clipper.toml`.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsProvider for FileSettingsProvider {
    fn load(&self) -> Result<RunSettings, ConfigError> {
        let mut settings = Settings::load_from(&self.path)?;
        if let Ok(to) = std::env::var(ENV_RECIPIENT) {
            if !to.trim().is_empty() {
                settings.delivery.to = Some(to.trim().to_string());
            }
        }
        let store = JsonFileStore::new(settings.keywords_path.clone());
        let keywords = settings.resolve_keywords(&store)?;
        Ok(RunSettings { settings, keywords })
    }
}

/// Fixed settings, for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticSettings(pub RunSettings);

impl SettingsProvider for StaticSettings {
    fn load(&self) -> Result<RunSettings, ConfigError> {
        Ok(self.0.clone())
    }
}
