// In-crate test double for the catalog seam.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{Catalog, Params};

enum Reply {
    Now(ApiResult<Value>),
    Gated(oneshot::Receiver<ApiResult<Value>>),
}

/// Replies are queued per path and consumed in call order; an unscripted path answers 404.
#[derive(Default)]
pub(crate) struct ScriptedCatalog {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl ScriptedCatalog {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, path: &str, reply: Reply) {
        self.routes.lock().unwrap().entry(path.to_string()).or_default().push_back(reply);
    }

    pub(crate) fn reply(&self, path: &str, body: Value) {
        self.push(path, Reply::Now(Ok(body)));
    }

    pub(crate) fn fail(&self, path: &str, err: ApiError) {
        self.push(path, Reply::Now(Err(err)));
    }

    /// Queue a reply that resolves only when the returned sender fires.
    pub(crate) fn gate(&self, path: &str) -> oneshot::Sender<ApiResult<Value>> {
        let (tx, rx) = oneshot::channel();
        self.push(path, Reply::Gated(rx));
        tx
    }

    pub(crate) fn calls(&self, path: &str) -> Vec<Params> {
        self.calls.lock().unwrap().iter().filter(|(p, _)| p == path).map(|(_, q)| q.clone()).collect()
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    async fn request(&self, path: &str, params: &Params) -> ApiResult<Value> {
        self.calls.lock().unwrap().push((path.to_string(), params.clone()));
        let next = self.routes.lock().unwrap().get_mut(path).and_then(|q| q.pop_front());
        match next {
            Some(Reply::Now(r)) => r,
            Some(Reply::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                Err(ApiError::Network { path: path.to_string(), message: "gate dropped".into() })
            }),
            None => Err(ApiError::FetchFailed { path: path.to_string(), status: 404 }),
        }
    }
}
