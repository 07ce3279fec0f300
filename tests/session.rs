use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use reelscout::config::{Config, StoreKind};
use reelscout::error::{ApiError, ApiResult};
use reelscout::filters::{FilterPatch, FilterState, SortBy};
use reelscout::gateway::{Catalog, Params};
use reelscout::{open_store, ReelScout};

/// Answers a fixed catalog; search results depend on nothing but the path.
#[derive(Default)]
struct FixtureCatalog {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn request(&self, path: &str, params: &Params) -> ApiResult<Value> {
        let query: Vec<String> = params.present().map(|(k, v)| format!("{k}={v}")).collect();
        self.seen.lock().unwrap().push(format!("{path}?{}", query.join("&")));
        match path {
            "/genre/movie/list" => Ok(json!({"genres": [{"id": 12, "name": "Adventure"}, {"id": 18, "name": "Drama"}]})),
            "/search/movie" => Ok(json!({
                "page": 1,
                "total_pages": 1,
                "results": [
                    {"id": 1, "title": "Dune", "genre_ids": [12, 878], "release_date": "2021-09-15", "vote_average": 7.8},
                    {"id": 2, "title": "Dune", "genre_ids": [12], "release_date": "1984-12-14", "vote_average": 6.3},
                    {"id": 3, "name": "Dune: Prophecy", "genre_ids": [18], "release_date": "2024-11-17"}
                ]
            })),
            "/discover/movie" => Ok(json!({"page": params.get("page").and_then(|p| p.parse::<u32>().ok()), "total_pages": 99999, "results": []})),
            "/movie/1" => Ok(json!({
                "id": 1, "title": "Dune", "release_date": "2021-09-15", "vote_average": 7.8,
                "genres": [{"id": 12, "name": "Adventure"}, {"id": 878, "name": "Science Fiction"}],
                "videos": {"results": [{"key": "teaser", "site": "YouTube", "type": "Teaser"}]}
            })),
            _ => Err(ApiError::FetchFailed { path: path.to_string(), status: 404 }),
        }
    }
}

fn json_config(dir: &std::path::Path) -> Config {
    Config {
        api_key: "test".into(),
        favorites_store: StoreKind::Json,
        favorites_path: Some(dir.join("favorites.json")),
        ..Config::default()
    }
}

#[tokio::test]
async fn search_refines_and_sorts_locally() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(FixtureCatalog::default());
    let store = open_store(&json_config(dir.path())).await.unwrap();
    let scout = ReelScout::with_catalog(catalog.clone(), store).await.unwrap();

    scout
        .set_filters(FilterState {
            query: "  dune ".into(),
            genre_id: Some(12),
            sort_by: SortBy::ReleaseDateAsc,
            ..FilterState::default()
        })
        .await;

    let page = scout.discovery().page();
    assert_eq!(page.error, None);
    assert_eq!(page.items.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 1]);
    assert!(catalog.seen.lock().unwrap().iter().any(|r| r.starts_with("/search/movie?query=dune&page=1")));

    scout.patch_filters(FilterPatch { year: Some(Some(2024)), genre_id: Some(None), ..FilterPatch::default() }).await;
    let items = scout.discovery().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Dune: Prophecy");
}

#[tokio::test]
async fn discovery_pagination_is_capped() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&json_config(dir.path())).await.unwrap();
    let scout = ReelScout::with_catalog(Arc::new(FixtureCatalog::default()), store).await.unwrap();

    scout.discovery().fetch_page(500).await;
    let page = scout.discovery().page();
    assert_eq!((page.page, page.total_pages), (500, 500));
    assert!(!scout.discovery().next().await);
    assert!(scout.discovery().prev().await);
    assert_eq!(scout.discovery().page().page, 499);
}

#[tokio::test]
async fn favorites_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = json_config(dir.path());

    let scout = ReelScout::with_catalog(Arc::new(FixtureCatalog::default()), open_store(&config).await.unwrap())
        .await
        .unwrap();
    assert!(scout.toggle_favorite_id(1).await.unwrap());
    scout.detail().load(1).await;
    assert_eq!(scout.detail().snapshot().trailer_key.as_deref(), Some("teaser"));
    scout.close().await.unwrap();

    let scout = ReelScout::with_catalog(Arc::new(FixtureCatalog::default()), open_store(&config).await.unwrap())
        .await
        .unwrap();
    let favs = scout.favorites();
    assert_eq!(favs.len(), 1);
    assert_eq!(favs[0].title, "Dune");
    assert_eq!(favs[0].genre_ids, Some(vec![12, 878]));
    assert!(scout.favorites_view_allowed());
}

#[tokio::test]
async fn missing_api_key_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config { api_key: String::new(), ..json_config(dir.path()) };
    let err = ReelScout::connect(&config).await.err().unwrap();
    assert!(err.to_string().contains("TMDB_API_KEY"));
}
