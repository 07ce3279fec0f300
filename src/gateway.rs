use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};

/// Query parameters for a catalog request.
///
/// Values are kept as `Option<String>` so callers can pass optional filters
/// straight through; absent and empty values are never sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, Option<String>)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, Some(value.to_string()));
        self
    }

    pub fn set_opt<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        self.insert(key, value.map(|v| v.to_string()));
        self
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: &str, value: Option<String>) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).and_then(|(_, v)| v.as_deref())
    }

    /// Pairs that will actually be sent.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.as_deref().filter(|v| !v.is_empty()).map(|v| (k.as_str(), v)))
    }
}

/// The seam between the engines and the remote catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// GET `path` with `params` and return the parsed JSON body.
    async fn request(&self, path: &str, params: &Params) -> ApiResult<Value>;
}

/// reqwest-backed TMDB gateway.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

// Sent on every request; caller parameters with these names are ignored.
const FIXED_PARAMS: [&str; 3] = ["api_key", "language", "include_adult"];

impl HttpCatalog {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("reelscout/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs.filter(|s| *s > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    /// Full request URL: fixed parameters first, then every present caller parameter.
    /// Adult titles are always excluded.
    pub fn build_url(&self, path: &str, params: &Params) -> ApiResult<Url> {
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidUrl { path: path.to_string(), message: e.to_string() })?;

        let mut pairs = Params::new()
            .set("api_key", &self.api_key)
            .set("language", &self.language)
            .set("include_adult", false);
        for (k, v) in params.present().filter(|(k, _)| !FIXED_PARAMS.contains(k)) {
            pairs.insert(k, Some(v.to_string()));
        }
        url.query_pairs_mut().extend_pairs(pairs.present());
        Ok(url)
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn request(&self, path: &str, params: &Params) -> ApiResult<Value> {
        let url = self.build_url(path, params)?;
        tracing::debug!(path, params = ?params.present().collect::<Vec<_>>(), "catalog request");

        let network = |e: reqwest::Error| ApiError::Network { path: path.to_string(), message: e.to_string() };
        let resp = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(network)?;

        check_status(path, resp.status())?;
        let body = resp.bytes().await.map_err(network)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::parse(path, e))
    }
}

fn check_status(path: &str, status: StatusCode) -> ApiResult<()> {
    if status.is_success() {
        return Ok(());
    }
    tracing::debug!(path, status = status.as_u16(), "catalog returned error status");
    Err(ApiError::FetchFailed { path: path.to_string(), status: status.as_u16() })
}
