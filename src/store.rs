//! Saved configurations
//!
//! Generated documents can be kept under a user-chosen name. The pipeline
//! never touches the store; the caller decides what to persist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SingBoxConfig;
use crate::error::{ConvertError, Result};

static NAME_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s.\-]").expect("valid regex"));
static NAME_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes a user-supplied configuration name.
///
/// Trims, drops everything except ASCII letters, digits, `_`, `.`, `-` and
/// whitespace, then joins whitespace runs with `_`.
pub fn sanitize_config_name(name: &str) -> Result<String> {
    let cleaned = NAME_DISALLOWED.replace_all(name.trim(), "");
    let cleaned = NAME_WHITESPACE.replace_all(cleaned.trim(), "_");
    if cleaned.is_empty() {
        return Err(ConvertError::InvalidConfigName(name.to_string()));
    }
    Ok(cleaned.into_owned())
}

// ============================================================================
// Store Trait
// ============================================================================

/// Name to document store
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// All saved documents keyed by name
    async fn get_all(&self) -> Result<BTreeMap<String, SingBoxConfig>>;

    async fn get(&self, name: &str) -> Result<Option<SingBoxConfig>> {
        Ok(self.get_all().await?.remove(name))
    }

    /// Saves `config` under `name`, replacing any previous entry
    async fn set(&self, name: &str, config: &SingBoxConfig) -> Result<()>;

    /// Removes `name`; returns whether it existed
    async fn delete(&self, name: &str) -> Result<bool>;

    async fn names(&self) -> Result<Vec<String>> {
        Ok(self.get_all().await?.into_keys().collect())
    }
}

/// Sanitizes `name` and saves `config` under it, returning the stored name
pub async fn save_named<S: ConfigStore + ?Sized>(
    store: &S,
    name: &str,
    config: &SingBoxConfig,
) -> Result<String> {
    let name = sanitize_config_name(name)?;
    store.set(&name, config).await?;
    info!("Saved config '{}'", name);
    Ok(name)
}

// ============================================================================
// JSON File Store
// ============================================================================

/// All documents in one JSON object file
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, SingBoxConfig>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {:?} does not exist yet", self.path);
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            ConvertError::Store(format!("corrupt store file {:?}: {}", self.path, e))
        })
    }

    async fn write_map(&self, map: &BTreeMap<String, SingBoxConfig>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, content).await?;
        debug!("Wrote {} configs to {:?}", map.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    async fn get_all(&self) -> Result<BTreeMap<String, SingBoxConfig>> {
        let _guard = self.lock.read().await;
        self.read_map().await
    }

    async fn set(&self, name: &str, config: &SingBoxConfig) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut map = self.read_map().await?;
        map.insert(name.to_string(), config.clone());
        self.write_map(&map).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.write().await;
        let mut map = self.read_map().await?;
        if map.remove(name).is_none() {
            return Ok(false);
        }
        self.write_map(&map).await?;
        Ok(true)
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, SingBoxConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_all(&self) -> Result<BTreeMap<String, SingBoxConfig>> {
        Ok(self.entries.read().await.clone())
    }

    async fn set(&self, name: &str, config: &SingBoxConfig) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(name.to_string(), config.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(name).is_some())
    }
}
