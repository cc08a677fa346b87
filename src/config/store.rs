// src/config/store.rs
//! Keyword persistence. Applied by callers after a successful `KeywordSet`
//! transformation; the set itself never touches storage.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::keywords::KeywordSet;

pub trait KeywordStore: Send + Sync {
    /// `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<KeywordSet>>;
    fn save(&self, set: &KeywordSet) -> Result<()>;
}

/// JSON array on disk, replaced whole through a temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeywordStore for JsonFileStore {
    fn load(&self) -> Result<Option<KeywordSet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading keywords from {}", self.path.display()))?;
        let set: KeywordSet = serde_json::from_str(&content)
            .with_context(|| format!("parsing keywords from {}", self.path.display()))?;
        Ok(Some(set))
    }

    fn save(&self, set: &KeywordSet) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(set).context("serializing keywords")?;
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<KeywordSet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(set: KeywordSet) -> Self {
        Self {
            inner: Mutex::new(Some(set)),
        }
    }
}

impl KeywordStore for MemoryStore {
    fn load(&self) -> Result<Option<KeywordSet>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("keyword store mutex poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, set: &KeywordSet) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("keyword store mutex poisoned"))?;
        *guard = Some(set.clone());
        Ok(())
    }
}
