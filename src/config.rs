use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Which backend persists the favorites set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Json,
}

/// Session configuration, read from `config.toml` and then overridden by the environment.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    /// Default locale for catalog text.
    pub language: String,
    /// Per-request timeout; unset means requests may wait indefinitely.
    pub timeout_secs: Option<u64>,
    pub favorites_store: StoreKind,
    pub database_url: Option<String>,
    pub favorites_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: None,
            favorites_store: StoreKind::default(),
            database_url: None,
            favorites_path: None,
        }
    }
}

// Keep the key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .field("favorites_store", &self.favorites_store)
            .field("database_url", &self.database_url)
            .field("favorites_path", &self.favorites_path)
            .finish()
    }
}

impl Config {
    /// Load from `REELSCOUT_CONFIG` (or the default config path), apply env overrides, validate.
    pub fn load() -> Result<Self> {
        let path = match std::env::var("REELSCOUT_CONFIG") {
            Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
            _ => default_config_path(),
        };
        let mut config = match path.as_deref() {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_env_from(|k| std::env::var(k).ok());
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config file: {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Environment overrides; `lookup` is `std::env::var` outside of tests.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("TMDB_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("REELSCOUT_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = get("REELSCOUT_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = Some(v);
        }
        if let Some(v) = get("REELSCOUT_DATABASE_URL") {
            self.database_url = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("TMDB API key is not configured: set TMDB_API_KEY or `api_key` in config.toml");
        }
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        Ok(())
    }

    pub fn favorites_path(&self) -> Result<PathBuf> {
        match &self.favorites_path {
            Some(p) => Ok(p.clone()),
            None => Ok(data_dir()?.join("favorites.json")),
        }
    }
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "reelscout", "reelscout")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("config.toml"))
}

pub(crate) fn data_dir() -> Result<PathBuf> {
    let proj = project_dirs().context("unable to determine data directory")?;
    Ok(proj.data_dir().to_path_buf())
}
