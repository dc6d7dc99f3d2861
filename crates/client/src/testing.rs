//! A scripted network for tests.
//!
//! Routes are registered per URL; unknown URLs answer 404. The whole network
//! can be switched off, single URLs can be made to fail, and every call can
//! be delayed (use a paused tokio clock to keep tests fast).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rostercache_core::{Error, HttpResponse};

use crate::fetch::Fetcher;
use crate::request::Request;

/// In-process [`Fetcher`] with canned responses.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, HttpResponse>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    latency: Mutex<Duration>,
    offline: AtomicBool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GETs of `url` with a 200 response.
    pub fn respond(&self, url: &str, content_type: &str, body: &'static str) {
        self.respond_status(url, 200, content_type, body);
    }

    pub fn respond_status(&self, url: &str, status: u16, content_type: &str, body: &'static str) {
        let response = HttpResponse::new(url, status, vec![("content-type".into(), content_type.into())], body);
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    /// Make requests for `url` fail at the transport level.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Number of fetches issued for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<HttpResponse, Error> {
        let url = request.url.as_str().to_string();
        self.calls.lock().unwrap().push(url.clone());

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }
        if self.failing.lock().unwrap().contains(&url) {
            return Err(Error::Network(format!("connection reset: {url}")));
        }

        let routed = self.routes.lock().unwrap().get(&url).cloned();
        Ok(routed.unwrap_or_else(|| HttpResponse::new(url, 404, Vec::new(), "not found")))
    }
}
