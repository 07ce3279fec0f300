mod page;
pub mod refine;

pub use page::{FetchStatus, Page};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::api::{self, MoviePage};
use crate::error::{message_or, ApiResult};
use crate::filters::{FilterState, SharedFilters, DEFAULT_SORT};
use crate::gateway::{Catalog, Params};
use crate::types::{Genre, Movie};

const ERROR_FALLBACK: &str = "Unknown error";

/// Paged movie listing driven by the session's filter state.
///
/// Clones share state. Every `fetch_page` takes a ticket from a per-engine
/// counter and only the holder of the newest ticket may write its result,
/// so overlapping calls settle on the most recently *started* request.
#[derive(Clone)]
pub struct DiscoveryEngine {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Arc<dyn Catalog>,
    filters: SharedFilters,
    page: Mutex<Page>,
    genres: Mutex<Vec<Genre>>,
    issued: AtomicU64,
    genre_task: Mutex<Option<JoinHandle<()>>>,
}

struct Loaded {
    items: Vec<Movie>,
    page: u32,
    total_pages: u32,
}

impl DiscoveryEngine {
    /// Build an engine and, when called inside a tokio runtime, start loading genres in the background.
    pub fn new(catalog: Arc<dyn Catalog>, filters: SharedFilters) -> Self {
        let engine = Self {
            inner: Arc::new(Inner {
                catalog,
                filters,
                page: Mutex::new(Page::default()),
                genres: Mutex::new(Vec::new()),
                issued: AtomicU64::new(0),
                genre_task: Mutex::new(None),
            }),
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let bg = engine.clone();
                let task = handle.spawn(async move { bg.load_genres().await });
                *lock(&engine.inner.genre_task) = Some(task);
            }
            Err(_) => tracing::debug!("no tokio runtime; genres are not preloaded"),
        }
        engine
    }

    pub fn filters(&self) -> &SharedFilters {
        &self.inner.filters
    }

    pub fn page(&self) -> Page {
        lock(&self.inner.page).clone()
    }

    pub fn items(&self) -> Vec<Movie> {
        lock(&self.inner.page).items.clone()
    }

    pub fn genres(&self) -> Vec<Genre> {
        lock(&self.inner.genres).clone()
    }

    /// Best-effort: a failure is logged and leaves the current list untouched.
    pub async fn load_genres(&self) {
        match api::fetch_genres(&*self.inner.catalog).await {
            Ok(genres) => {
                tracing::debug!(count = genres.len(), "genres loaded");
                *lock(&self.inner.genres) = genres;
            }
            Err(e) => tracing::warn!(error = %e, "failed to load genres"),
        }
    }

    /// Wait for the background genre load started by `new`, if any.
    pub async fn wait_for_genres(&self) {
        let task = lock(&self.inner.genre_task).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Fetch page `n` (clamped to at least 1) for the current filters.
    ///
    /// Never fails: errors land in [`Page::error`] and leave the previous items in place.
    pub async fn fetch_page(&self, n: u32) {
        let n = n.max(1);
        let ticket = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let filters = self.inner.filters.snapshot();
        lock(&self.inner.page).begin();
        tracing::debug!(ticket, page = n, search = filters.search_text().is_some(), "fetching page");

        let outcome = self.load(&filters, n).await;

        if self.inner.issued.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, "discarding superseded page result");
            return;
        }
        let mut page = lock(&self.inner.page);
        match outcome {
            Ok(loaded) => page.succeed(loaded.items, loaded.page, loaded.total_pages),
            Err(e) => {
                tracing::warn!(error = %e, page = n, "page fetch failed");
                page.fail(message_or(&e, ERROR_FALLBACK));
            }
        }
    }

    /// Fetch the following page; returns `false` without fetching on the last page.
    pub async fn next(&self) -> bool {
        let current = self.page();
        if !current.has_next() {
            return false;
        }
        self.fetch_page(current.page + 1).await;
        true
    }

    /// Fetch the preceding page; returns `false` without fetching on page 1.
    pub async fn prev(&self) -> bool {
        let current = self.page();
        if !current.has_prev() {
            return false;
        }
        self.fetch_page(current.page - 1).await;
        true
    }

    async fn load(&self, filters: &FilterState, n: u32) -> ApiResult<Loaded> {
        let catalog = &*self.inner.catalog;

        if let Some(query) = filters.search_text() {
            let resp = api::search_movies(catalog, query, n).await?;
            return Ok(Self::loaded(resp, n, |items| refine::refine(items, filters)));
        }

        let sort = match filters.sort_by.as_str() {
            "" => DEFAULT_SORT,
            s => s,
        };
        let params = Params::new()
            .set("page", n)
            .set("sort_by", sort)
            .set_opt("with_genres", filters.genre_id)
            .set_opt("primary_release_year", filters.year);
        let resp = api::discover_movies(catalog, &params).await?;
        Ok(Self::loaded(resp, n, |items| items))
    }

    fn loaded(resp: MoviePage, requested: u32, post: impl FnOnce(Vec<Movie>) -> Vec<Movie>) -> Loaded {
        let page = resp.page_or(requested);
        let total_pages = resp.total_pages_clamped();
        Loaded { items: post(resp.into_results()), page, total_pages }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
