use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::favorites::FavoriteEntry;

/// Persistence seam for the favorites set. `save` always receives the full
/// list in display order.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn load(&self) -> Result<Vec<FavoriteEntry>>;
    async fn save(&self, entries: &[FavoriteEntry]) -> Result<()>;
}

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    version: u32,
    #[serde(default)]
    favorites: Vec<FavoriteEntry>,
}

/// Favorites kept in a single JSON document, rewritten atomically on save.
///
/// ```json
/// { "version": 1, "favorites": [ { "id": 438631, "title": "Dune", ... } ] }
/// ```
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FavoritesStore for JsonStore {
    async fn load(&self) -> Result<Vec<FavoriteEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "no favorites file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let file: FavoritesFile = serde_json::from_str(&contents)
            .with_context(|| format!("parsing favorites file {}", self.path.display()))?;
        if file.version > FORMAT_VERSION {
            anyhow::bail!(
                "favorites file {} has unsupported version {}",
                self.path.display(),
                file.version
            );
        }
        tracing::debug!(version = file.version, count = file.favorites.len(), "loaded favorites");
        Ok(file.favorites)
    }

    async fn save(&self, entries: &[FavoriteEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let file = FavoritesFile { version: FORMAT_VERSION, favorites: entries.to_vec() };
        let json = serde_json::to_string_pretty(&file).context("serializing favorites")?;

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        tracing::debug!(path = ?self.path, count = entries.len(), "favorites saved");
        Ok(())
    }
}

/// Process-local store; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<FavoriteEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<FavoriteEntry>) -> Self {
        Self { entries: Mutex::new(entries) }
    }

    pub fn snapshot(&self) -> Vec<FavoriteEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl FavoritesStore for MemoryStore {
    async fn load(&self) -> Result<Vec<FavoriteEntry>> {
        Ok(self.snapshot())
    }

    async fn save(&self, entries: &[FavoriteEntry]) -> Result<()> {
        *self.entries.lock().unwrap_or_else(|p| p.into_inner()) = entries.to_vec();
        Ok(())
    }
}
