pub mod api;
pub mod config;
pub mod dao;
pub mod db;
pub mod detail;
pub mod discovery;
pub mod error;
pub mod favorites;
pub mod filters;
pub mod gateway;
pub mod images;
pub mod mapping;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::api::{DetailRecord, Video};
    pub use crate::config::{Config, StoreKind};
    pub use crate::detail::{DetailLoader, DetailSnapshot};
    pub use crate::discovery::{DiscoveryEngine, FetchStatus, Page};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::favorites::{FavoriteEntry, FavoritesSet};
    pub use crate::filters::{FilterPatch, FilterState, SharedFilters, SortBy};
    pub use crate::gateway::{Catalog, HttpCatalog, Params};
    pub use crate::storage::FavoritesStore;
    pub use crate::types::{Genre, Movie};
    pub use crate::ReelScout;
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::config::{Config, StoreKind};
use crate::db::Database;
use crate::detail::DetailLoader;
use crate::discovery::DiscoveryEngine;
use crate::favorites::{FavoriteEntry, FavoritesSet};
use crate::filters::{FilterPatch, FilterState, SharedFilters};
use crate::gateway::{Catalog, HttpCatalog};
use crate::storage::{FavoritesStore, JsonStore};
use crate::types::Movie;

/// One browsing session: the catalog gateway, shared filters, the discovery
/// engine, a detail loader and the favorites set with its store.
///
/// Favorites are written through to the store after every mutation.
pub struct ReelScout {
    catalog: Arc<dyn Catalog>,
    filters: SharedFilters,
    discovery: DiscoveryEngine,
    detail: DetailLoader,
    favorites: Mutex<FavoritesSet>,
    store: Arc<dyn FavoritesStore>,
    // Serializes store writes so a slower save never lands after a newer one.
    save_lock: tokio::sync::Mutex<()>,
}

impl ReelScout {
    /// Validate `config`, build the HTTP gateway and the configured store, and load favorites.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let catalog = HttpCatalog::from_config(config).context("building HTTP client")?;
        let store = open_store(config).await?;
        tracing::info!(base_url = %config.base_url, store = ?config.favorites_store, "session starting");
        Self::with_catalog(Arc::new(catalog), store).await
    }

    /// Session over any catalog and store.
    pub async fn with_catalog(catalog: Arc<dyn Catalog>, store: Arc<dyn FavoritesStore>) -> Result<Self> {
        let entries = store.load().await.context("loading favorites")?;
        let favorites = FavoritesSet::from_entries(entries);
        tracing::debug!(count = favorites.count(), "favorites loaded");

        let filters = SharedFilters::default();
        let discovery = DiscoveryEngine::new(catalog.clone(), filters.clone());
        let detail = DetailLoader::new(catalog.clone());
        Ok(Self {
            catalog,
            filters,
            discovery,
            detail,
            favorites: Mutex::new(favorites),
            store,
            save_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn discovery(&self) -> &DiscoveryEngine {
        &self.discovery
    }

    pub fn detail(&self) -> &DetailLoader {
        &self.detail
    }

    pub fn filters(&self) -> FilterState {
        self.filters.snapshot()
    }

    /// Replace the filters and reload from page 1.
    pub async fn set_filters(&self, next: FilterState) {
        self.filters.replace(next);
        self.discovery.fetch_page(1).await;
    }

    /// Apply a partial update and reload from page 1.
    pub async fn patch_filters(&self, patch: FilterPatch) {
        self.filters.patch(patch);
        self.discovery.fetch_page(1).await;
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.lock_favorites().has(id)
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.lock_favorites().list()
    }

    pub fn favorites_count(&self) -> usize {
        self.lock_favorites().count()
    }

    /// Whether a favorites view has anything to show.
    pub fn favorites_view_allowed(&self) -> bool {
        favorites::favorites_view_allowed(&self.lock_favorites())
    }

    /// Toggle `movie` and persist. Returns whether it is a favorite afterwards.
    pub async fn toggle_favorite(&self, movie: &Movie) -> Result<bool> {
        self.mutate_favorites(|set| set.toggle(movie)).await
    }

    /// Toggle by id. Adding needs the record, so an unknown id is fetched first.
    pub async fn toggle_favorite_id(&self, id: i64) -> Result<bool> {
        if self.is_favorite(id) {
            self.remove_favorite(id).await?;
            return Ok(false);
        }
        let record = api::movie_details(&*self.catalog, id)
            .await
            .with_context(|| format!("looking up movie {id}"))?;
        self.toggle_favorite(&record.to_movie()).await
    }

    pub async fn remove_favorite(&self, id: i64) -> Result<bool> {
        self.mutate_favorites(|set| set.remove(id)).await
    }

    pub async fn clear_favorites(&self) -> Result<()> {
        self.mutate_favorites(|set| set.clear()).await
    }

    /// Persist favorites one last time and end the session.
    pub async fn close(self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let entries = self.lock_favorites().entries();
        self.store.save(&entries).await.context("saving favorites")?;
        tracing::info!(favorites = entries.len(), "session closed");
        Ok(())
    }

    // The change is made on a copy and only becomes visible once the store accepted it.
    // Every mutation holds `save_lock`, so nothing else can touch the set in between.
    async fn mutate_favorites<T>(&self, f: impl FnOnce(&mut FavoritesSet) -> T) -> Result<T> {
        let _guard = self.save_lock.lock().await;
        let mut next = self.lock_favorites().clone();
        let out = f(&mut next);
        let entries = next.entries();
        self.store.save(&entries).await.context("saving favorites")?;
        *self.lock_favorites() = next;
        tracing::debug!(count = entries.len(), "favorites saved");
        Ok(out)
    }

    fn lock_favorites(&self) -> MutexGuard<'_, FavoritesSet> {
        self.favorites.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the favorites store selected by `config.favorites_store`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn FavoritesStore>> {
    match config.favorites_store {
        StoreKind::Sqlite => {
            let db = Database::connect(config.database_url.as_deref()).await?;
            db.run_migrations().await?;
            Ok(Arc::new(db))
        }
        StoreKind::Json => Ok(Arc::new(JsonStore::new(config.favorites_path()?))),
    }
}
