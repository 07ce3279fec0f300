use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::{self, DetailRecord, Video};
use crate::error::message_or;
use crate::gateway::Catalog;

const ERROR_FALLBACK: &str = "Failed to load movie details";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailSnapshot {
    pub record: Option<DetailRecord>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub trailer_key: Option<String>,
}

#[derive(Default)]
struct DetailState {
    record: Option<DetailRecord>,
    is_loading: bool,
    error: Option<String>,
    current_id: Option<i64>,
}

/// Loads the extended record for one movie at a time.
///
/// Sequencing matches [`crate::discovery::DiscoveryEngine`]: only the most
/// recently started load may write its outcome.
#[derive(Clone)]
pub struct DetailLoader {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Arc<dyn Catalog>,
    state: Mutex<DetailState>,
    issued: AtomicU64,
}

impl DetailLoader {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                state: Mutex::new(DetailState::default()),
                issued: AtomicU64::new(0),
            }),
        }
    }

    pub fn current_id(&self) -> Option<i64> {
        lock(&self.inner.state).current_id
    }

    pub fn snapshot(&self) -> DetailSnapshot {
        let state = lock(&self.inner.state);
        let trailer_key = state
            .record
            .as_ref()
            .and_then(|r| trailer_key(&r.videos))
            .map(str::to_string);
        DetailSnapshot {
            record: state.record.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
            trailer_key,
        }
    }

    /// Fetch the record for `id`. `0` is treated as "no selection" and ignored.
    pub async fn load(&self, id: i64) {
        if id == 0 {
            return;
        }
        let ticket = self.begin(id);
        self.finish(ticket, id).await;
    }

    // Takes the ticket and marks the id as loading. Callers that hand the
    // fetch to another task call this first so tickets follow request order.
    fn begin(&self, id: i64) -> u64 {
        let ticket = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = lock(&self.inner.state);
        state.current_id = Some(id);
        state.is_loading = true;
        state.error = None;
        ticket
    }

    async fn finish(&self, ticket: u64, id: i64) {
        tracing::debug!(ticket, id, "loading movie details");

        let outcome = api::movie_details(&*self.inner.catalog, id).await;

        if self.inner.issued.load(Ordering::SeqCst) != ticket {
            tracing::debug!(ticket, id, "discarding superseded detail result");
            return;
        }
        let mut state = lock(&self.inner.state);
        state.is_loading = false;
        match outcome {
            Ok(record) => state.record = Some(record),
            Err(e) => {
                tracing::warn!(error = %e, id, "detail fetch failed");
                state.error = Some(message_or(&e, ERROR_FALLBACK));
            }
        }
    }

    /// Load the current id again; does nothing before the first load.
    pub async fn reload(&self) {
        if let Some(id) = self.current_id() {
            self.load(id).await;
        }
    }

    /// Follow an externally owned id. Each value (the initial one included)
    /// starts its own load without waiting on the previous one.
    pub fn observe(&self, mut ids: watch::Receiver<Option<i64>>) -> JoinHandle<()> {
        let loader = self.clone();
        tokio::spawn(async move {
            loop {
                let id = *ids.borrow_and_update();
                if let Some(id) = id.filter(|id| *id != 0) {
                    let ticket = loader.begin(id);
                    let l = loader.clone();
                    tokio::spawn(async move { l.finish(ticket, id).await });
                }
                if ids.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

/// First YouTube trailer, else the first YouTube video of any kind.
pub fn trailer_key(videos: &[Video]) -> Option<&str> {
    let youtube = || videos.iter().filter(|v| v.site == "YouTube");
    youtube()
        .find(|v| v.kind == "Trailer")
        .or_else(|| youtube().next())
        .map(|v| v.key.as_str())
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::testing::ScriptedCatalog;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn video(key: &str, site: &str, kind: &str) -> Video {
        Video { key: key.into(), site: site.into(), kind: kind.into(), name: String::new() }
    }

    fn detail(id: i64, title: &str, videos: Value) -> Value {
        json!({
            "id": id,
            "title": title,
            "runtime": 155,
            "genres": [{"id": 878, "name": "Science Fiction"}],
            "credits": {"cast": [{"id": 1, "name": "Timothée Chalamet", "character": "Paul"}], "crew": []},
            "videos": {"results": videos}
        })
    }

    #[test]
    fn trailer_prefers_youtube_trailer() {
        let videos = vec![
            video("a", "Vimeo", "Trailer"),
            video("b", "YouTube", "Teaser"),
            video("c", "YouTube", "Trailer"),
        ];
        assert_eq!(trailer_key(&videos), Some("c"));
        assert_eq!(trailer_key(&videos[..2]), Some("b"));
        assert_eq!(trailer_key(&videos[..1]), None);
        assert_eq!(trailer_key(&[]), None);
    }

    #[tokio::test]
    async fn load_exposes_record_and_trailer() {
        let catalog = ScriptedCatalog::new();
        catalog.reply("/movie/438631", detail(438631, "Dune", json!([
            {"key": "n9xhJrPXop4", "site": "YouTube", "type": "Trailer", "name": "Official"}
        ])));
        let loader = DetailLoader::new(catalog.clone());

        loader.load(438631).await;

        let snap = loader.snapshot();
        assert!(!snap.is_loading);
        assert_eq!(snap.error, None);
        let record = snap.record.unwrap();
        assert_eq!(record.title, "Dune");
        assert_eq!(record.runtime, Some(155));
        assert_eq!(record.credits.cast[0].character.as_deref(), Some("Paul"));
        assert_eq!(snap.trailer_key.as_deref(), Some("n9xhJrPXop4"));
        assert_eq!(
            catalog.calls("/movie/438631")[0].get("append_to_response"),
            Some("credits,videos")
        );
    }

    #[tokio::test]
    async fn zero_id_is_ignored_and_reload_needs_an_id() {
        let catalog = ScriptedCatalog::new();
        let loader = DetailLoader::new(catalog.clone());
        loader.load(0).await;
        loader.reload().await;
        assert_eq!(loader.current_id(), None);
        assert_eq!(loader.snapshot(), DetailSnapshot::default());
    }

    #[tokio::test]
    async fn failure_keeps_previous_record() {
        let catalog = ScriptedCatalog::new();
        catalog.reply("/movie/7", detail(7, "Seven", json!([])));
        catalog.fail("/movie/7", ApiError::FetchFailed { path: "/movie/7".into(), status: 500 });
        let loader = DetailLoader::new(catalog.clone());

        loader.load(7).await;
        loader.reload().await;

        let snap = loader.snapshot();
        assert_eq!(snap.record.map(|r| r.title), Some("Seven".to_string()));
        assert_eq!(snap.error.as_deref(), Some("Failed to fetch /movie/7 (500)"));
        assert!(!snap.is_loading);
        assert_eq!(snap.trailer_key, None);
    }

    #[tokio::test]
    async fn superseded_load_is_discarded() {
        let catalog = ScriptedCatalog::new();
        let slow = catalog.gate("/movie/1");
        catalog.reply("/movie/2", detail(2, "Two", json!([])));
        let loader = DetailLoader::new(catalog.clone());

        let second = loader.clone();
        tokio::join!(loader.load(1), async move {
            tokio::task::yield_now().await;
            second.load(2).await;
            slow.send(Ok(detail(1, "One", json!([])))).unwrap();
        });

        let snap = loader.snapshot();
        assert_eq!(snap.record.map(|r| r.id), Some(2));
        assert_eq!(loader.current_id(), Some(2));
    }

    #[tokio::test]
    async fn observe_follows_the_watched_id() {
        let catalog = ScriptedCatalog::new();
        catalog.reply("/movie/5", detail(5, "Five", json!([])));
        catalog.reply("/movie/6", detail(6, "Six", json!([])));
        let loader = DetailLoader::new(catalog.clone());
        let (tx, rx) = watch::channel(Some(5));

        let task = loader.observe(rx);
        wait_for(&loader, 5).await;

        tx.send(Some(0)).unwrap();
        tx.send(Some(6)).unwrap();
        wait_for(&loader, 6).await;

        drop(tx);
        task.await.unwrap();
        assert!(catalog.calls("/movie/0").is_empty());
    }

    #[tokio::test]
    async fn observed_changes_are_sequenced_in_watch_order() {
        let catalog = ScriptedCatalog::new();
        let five = catalog.gate("/movie/5");
        let six = catalog.gate("/movie/6");
        let loader = DetailLoader::new(catalog.clone());
        let (tx, rx) = watch::channel(Some(5));

        let task = loader.observe(rx);
        wait_until(|| loader.current_id() == Some(5)).await;
        tx.send(Some(6)).unwrap();
        wait_until(|| loader.current_id() == Some(6)).await;
        wait_until(|| catalog.calls("/movie/6").len() == 1).await;

        six.send(Ok(detail(6, "Six", json!([])))).unwrap();
        wait_for(&loader, 6).await;
        five.send(Ok(detail(5, "Five", json!([])))).unwrap();
        drop(tx);
        task.await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snap = loader.snapshot();
        assert_eq!(snap.record.map(|r| r.id), Some(6));
        assert!(!snap.is_loading);
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition never held");
    }

    async fn wait_for(loader: &DetailLoader, id: i64) {
        for _ in 0..200 {
            if loader.snapshot().record.map(|r| r.id) == Some(id) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("record {id} never loaded");
    }
}
