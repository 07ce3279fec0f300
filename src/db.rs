use anyhow::{Context, Result};
use sqlx::{any::AnyConnectOptions, AnyPool, ConnectOptions, migrate::Migrator};
use sqlx::any::AnyPoolOptions;
use std::{path::{Path, PathBuf}, str::FromStr};
use std::sync::Once;

use crate::dao;
use crate::favorites::FavoriteEntry;
use crate::mapping::{favorite_from_row, favorite_row_from};
use crate::storage::FavoritesStore;

// Ensure drivers are installed exactly once for sqlx::any
static INSTALL_DRIVERS: Once = Once::new();

// Embed SQL migrations from the migrations/ directory
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed favorites store.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    // Create a connection pool. If database_url is None, use a sensible default
    // (SQLite file in the user's data directory).
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        // Register compiled-in drivers for sqlx::any
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let url = match database_url {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => default_sqlite_url()?,
        };

        let opts = AnyConnectOptions::from_str(&url)
            .with_context(|| format!("invalid database URL: {url}"))?;
        // Quiet by default; callers can enable SQLX_LOG if they want
        let opts = opts.disable_statement_logging();

        let pool = AnyPoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to connect to database: {url}"))?;

        tracing::debug!(%url, "database connected");
        Ok(Self { pool })
    }

    /// Connect to a SQLite file at `path`, creating it if needed, and apply migrations.
    pub async fn open_file(path: &Path) -> Result<Self> {
        let db = Self::connect(Some(&sqlite_url_for(path)?)).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.context("running migrations")
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl FavoritesStore for Database {
    async fn load(&self) -> Result<Vec<FavoriteEntry>> {
        dao::list_favorites(&self.pool).await?.into_iter().map(favorite_from_row).collect()
    }

    async fn save(&self, entries: &[FavoriteEntry]) -> Result<()> {
        let rows = entries
            .iter()
            .enumerate()
            .map(|(i, e)| favorite_row_from(i as i64, e))
            .collect::<Result<Vec<_>>>()?;
        dao::replace_favorites(&self.pool, &rows).await.context("saving favorites")
    }
}

fn default_sqlite_url() -> Result<String> {
    let mut path: PathBuf = crate::config::data_dir()
        .context("unable to determine data directory for default sqlite path")?;
    path.push("reelscout.db");
    sqlite_url_for(&path)
}

fn sqlite_url_for(path: &Path) -> Result<String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating db parent dir: {}", parent.display()))?;
    }

    // Encode spaces in the path for a valid sqlite URL; `mode=rwc` creates the file
    let mut path_str = path.to_string_lossy().to_string();
    if path_str.contains(' ') {
        path_str = path_str.replace(' ', "%20");
    }
    Ok(format!("sqlite://{path_str}?mode=rwc"))
}
