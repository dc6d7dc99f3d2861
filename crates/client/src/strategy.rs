//! The request interceptor and its serving strategies.
//!
//! [`Interceptor::handle`] classifies a request and runs the one strategy the
//! policy table assigns to it. Transport failures never escape: each strategy
//! turns them into a cached copy, the shell document or a synthesized body.
//!
//! Every live response that reaches the caller is also written to the
//! dynamic store. The store keeps its own copy of the already-received body;
//! the caller and the store see the same bytes without a second fetch.

use std::sync::Arc;

use rostercache_core::{CacheStorage, Error, HttpResponse};
use serde::Serialize;

use crate::best_effort::BestEffort;
use crate::classify::{Classification, Strategy, classify};
use crate::fetch::{Fetcher, cache_key};
use crate::request::Request;
use crate::scope::Scope;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedBy {
    /// An entry in the dynamic store.
    Cache,
    /// A live response (also mirrored into the dynamic store).
    Network,
    /// The shell document, served in place of an unreachable resource.
    ShellFallback,
    /// A body made up on the spot (the empty catalog).
    Synthesized,
}

impl ServedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            ServedBy::Cache => "cache",
            ServedBy::Network => "network",
            ServedBy::ShellFallback => "shell_fallback",
            ServedBy::Synthesized => "synthesized",
        }
    }
}

/// A response produced by the interceptor.
#[derive(Debug, Clone)]
pub struct Served {
    pub classification: Classification,
    pub served_by: ServedBy,
    pub response: HttpResponse,
}

/// Result of offering a request to the interceptor.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The interceptor answered the request.
    Served(Served),
    /// Not intercepted; default network handling applies.
    PassThrough(Classification),
    /// Intercepted, but neither network, cache nor shell could answer.
    Unresolved(Classification),
}

impl Outcome {
    pub fn classification(&self) -> Classification {
        match self {
            Outcome::Served(served) => served.classification,
            Outcome::PassThrough(c) | Outcome::Unresolved(c) => *c,
        }
    }

    pub fn served(&self) -> Option<&Served> {
        match self {
            Outcome::Served(served) => Some(served),
            _ => None,
        }
    }

    pub fn into_served(self) -> Option<Served> {
        match self {
            Outcome::Served(served) => Some(served),
            _ => None,
        }
    }
}

/// Routes intercepted requests through the dynamic store and the network.
pub struct Interceptor {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    scope: Arc<Scope>,
    dynamic_cache: String,
    revalidation: BestEffort,
}

/// Answer from a strategy before it is tagged with the classification.
type Answer = Option<(ServedBy, HttpResponse)>;

impl Interceptor {
    pub fn new(
        storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, scope: Arc<Scope>, dynamic_cache: impl Into<String>,
    ) -> Self {
        Self { storage, fetcher, scope, dynamic_cache: dynamic_cache.into(), revalidation: BestEffort::new("revalidate") }
    }

    /// Background refreshes started for cached images.
    pub fn revalidation(&self) -> &BestEffort {
        &self.revalidation
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Classify `request` and serve it with the strategy assigned to its class.
    pub async fn handle(&self, request: &Request) -> Outcome {
        let classification = classify(request, &self.scope);

        let answer = match classification.strategy() {
            Strategy::PassThrough => {
                tracing::debug!(method = %request.method, url = %request.url, "not intercepted");
                return Outcome::PassThrough(classification);
            }
            Strategy::CacheFirst => cache_first(self, request, false).await,
            Strategy::CacheFirstRevalidate => cache_first(self, request, true).await,
            Strategy::NetworkFirst => Some(network_first(self, request).await),
        };

        match answer {
            Some((served_by, response)) => {
                tracing::debug!(
                    url = %request.url,
                    classification = classification.as_str(),
                    served_by = served_by.as_str(),
                    status = response.status,
                    "served"
                );
                Outcome::Served(Served { classification, served_by, response })
            }
            None => {
                tracing::warn!(
                    url = %request.url,
                    classification = classification.as_str(),
                    "unresolved: no network, no cache, no shell"
                );
                Outcome::Unresolved(classification)
            }
        }
    }

    async fn lookup(&self, key: &str) -> Option<HttpResponse> {
        match self.storage.match_in(&self.dynamic_cache, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = key, error = %e, "cache lookup failed; treating as miss");
                None
            }
        }
    }

    async fn mirror(&self, key: &str, response: &HttpResponse) {
        if let Err(e) = self.storage.put(&self.dynamic_cache, key, response).await {
            tracing::warn!(url = key, error = %e, "failed to store response copy");
        }
    }

    async fn shell_fallback(&self) -> Answer {
        let shell = self.scope.shell_document().as_str();
        match self.storage.match_any(shell).await {
            Ok(Some(response)) => Some((ServedBy::ShellFallback, response)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(url = shell, error = %e, "shell lookup failed");
                None
            }
        }
    }

    fn spawn_revalidation(&self, request: &Request, key: &str) {
        let storage = Arc::clone(&self.storage);
        let fetcher = Arc::clone(&self.fetcher);
        let store = self.dynamic_cache.clone();
        let request = request.clone();
        let key_owned = key.to_string();

        // Detached: the cached response is returned without waiting on this.
        drop(self.revalidation.spawn(key, async move {
            let response = fetcher.fetch(&request).await?;
            storage.put(&store, &key_owned, &response).await
        }));
    }
}

/// Dynamic store first; on a miss fetch and store; when the network fails, the shell.
async fn cache_first(ctx: &Interceptor, request: &Request, revalidate: bool) -> Answer {
    let key = cache_key(&request.url);

    if let Some(cached) = ctx.lookup(&key).await {
        if revalidate {
            ctx.spawn_revalidation(request, &key);
        }
        return Some((ServedBy::Cache, cached));
    }

    match fetch_and_store(ctx, request, &key).await {
        Ok(response) => Some((ServedBy::Network, response)),
        Err(e) => {
            tracing::debug!(url = %key, error = %e, "fetch failed; falling back to shell");
            ctx.shell_fallback().await
        }
    }
}

/// Network first; on failure the dynamic store; failing that, `[]`.
async fn network_first(ctx: &Interceptor, request: &Request) -> (ServedBy, HttpResponse) {
    let key = cache_key(&request.url);

    match fetch_and_store(ctx, request, &key).await {
        Ok(response) => (ServedBy::Network, response),
        Err(e) => {
            tracing::debug!(url = %key, error = %e, "fetch failed; trying dynamic store");
            match ctx.lookup(&key).await {
                Some(cached) => (ServedBy::Cache, cached),
                None => (ServedBy::Synthesized, HttpResponse::empty_json_list(key)),
            }
        }
    }
}

async fn fetch_and_store(ctx: &Interceptor, request: &Request, key: &str) -> Result<HttpResponse, Error> {
    let response = ctx.fetcher.fetch(request).await?;
    ctx.mirror(key, &response).await;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedFetcher;
    use reqwest::Method;
    use rostercache_core::MemoryStorage;
    use std::time::Duration;

    const DYNAMIC: &str = "app-dynamic-v1";
    const ORIGIN: &str = "http://127.0.0.1:8080";

    struct Harness {
        storage: Arc<MemoryStorage>,
        fetcher: Arc<ScriptedFetcher>,
        interceptor: Interceptor,
    }

    fn harness() -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let scope = Scope::new(&format!("{ORIGIN}/"), "index.html", "/rooster.json", vec!["images.start.gg".into()])
            .unwrap();
        let interceptor = Interceptor::new(storage.clone(), fetcher.clone(), Arc::new(scope), DYNAMIC);
        Harness { storage, fetcher, interceptor }
    }

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    fn expect_served(outcome: Outcome) -> Served {
        match outcome {
            Outcome::Served(served) => served,
            other => panic!("expected a served response, got {other:?}"),
        }
    }

    async fn seed_shell(h: &Harness) {
        h.storage
            .put("app-static-v1", &url("/index.html"), &HttpResponse::new(url("/index.html"), 200, Vec::new(), "<shell>"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_manifest_network_success_mirrors_same_bytes() {
        let h = harness();
        h.fetcher.respond(&url("/rooster.json"), "application/json", r#"[{"id":1}]"#);

        let served = expect_served(h.interceptor.handle(&Request::get(&url("/rooster.json")).unwrap()).await);
        assert_eq!(served.classification, Classification::ManifestData);
        assert_eq!(served.served_by, ServedBy::Network);
        assert_eq!(&served.response.body[..], br#"[{"id":1}]"#);

        let stored = h.storage.match_in(DYNAMIC, &url("/rooster.json")).await.unwrap().unwrap();
        assert_eq!(stored.body, served.response.body);
        assert_eq!(h.fetcher.calls(&url("/rooster.json")), 1);
    }

    #[tokio::test]
    async fn test_manifest_offline_uncached_yields_empty_list() {
        let h = harness();
        h.fetcher.set_offline(true);

        let served = expect_served(h.interceptor.handle(&Request::get(&url("/rooster.json")).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::Synthesized);
        assert_eq!(&served.response.body[..], b"[]");
        assert_eq!(served.response.content_type(), Some("application/json"));
        assert!(h.storage.match_in(DYNAMIC, &url("/rooster.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manifest_offline_cached_serves_copy() {
        let h = harness();
        h.fetcher.respond(&url("/rooster.json"), "application/json", "[1,2]");
        h.interceptor.handle(&Request::get(&url("/rooster.json")).unwrap()).await;

        h.fetcher.set_offline(true);
        let served = expect_served(h.interceptor.handle(&Request::get(&url("/rooster.json")).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::Cache);
        assert_eq!(&served.response.body[..], b"[1,2]");
    }

    #[tokio::test]
    async fn test_manifest_prefers_network_over_cache() {
        let h = harness();
        h.storage
            .put(DYNAMIC, &url("/rooster.json"), &HttpResponse::new(url("/rooster.json"), 200, Vec::new(), "[\"stale\"]"))
            .await
            .unwrap();
        h.fetcher.respond(&url("/rooster.json"), "application/json", "[\"fresh\"]");

        let served = expect_served(h.interceptor.handle(&Request::get(&url("/rooster.json")).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::Network);
        assert_eq!(&served.response.body[..], b"[\"fresh\"]");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_image_does_not_wait_for_network() {
        let h = harness();
        let image = "https://images.start.gg/portraits/7.png";
        h.storage
            .put(DYNAMIC, image, &HttpResponse::new(image, 200, Vec::new(), "old-png"))
            .await
            .unwrap();
        h.fetcher.respond(image, "image/png", "new-png");
        h.fetcher.set_latency(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let served = expect_served(h.interceptor.handle(&Request::image(image).unwrap()).await);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(served.served_by, ServedBy::Cache);
        assert_eq!(&served.response.body[..], b"old-png");
        assert_eq!(h.interceptor.revalidation().attempts(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.fetcher.calls(image), 1);
        let refreshed = h.storage.match_in(DYNAMIC, image).await.unwrap().unwrap();
        assert_eq!(&refreshed.body[..], b"new-png");
    }

    #[tokio::test]
    async fn test_cached_image_revalidation_failure_is_invisible() {
        let h = harness();
        let image = "https://images.start.gg/portraits/8.png";
        h.storage
            .put(DYNAMIC, image, &HttpResponse::new(image, 200, Vec::new(), "kept"))
            .await
            .unwrap();
        h.fetcher.set_offline(true);

        let served = expect_served(h.interceptor.handle(&Request::image(image).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::Cache);
        assert_eq!(h.interceptor.revalidation().attempts(), 1);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let entry = h.storage.match_in(DYNAMIC, image).await.unwrap().unwrap();
        assert_eq!(&entry.body[..], b"kept");
    }

    #[tokio::test]
    async fn test_uncached_image_fetches_and_stores_without_revalidation() {
        let h = harness();
        let image = "https://images.start.gg/portraits/9.png";
        h.fetcher.respond(image, "image/png", "png");

        let served = expect_served(h.interceptor.handle(&Request::image(image).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::Network);
        assert_eq!(h.interceptor.revalidation().attempts(), 0);
        assert!(h.storage.match_in(DYNAMIC, image).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_uncached_image_offline_falls_back_to_shell() {
        let h = harness();
        seed_shell(&h).await;
        h.fetcher.set_offline(true);

        let served = expect_served(h.interceptor.handle(&Request::image("https://images.start.gg/x.png").unwrap()).await);
        assert_eq!(served.served_by, ServedBy::ShellFallback);
        assert_eq!(&served.response.body[..], b"<shell>");
    }

    #[tokio::test]
    async fn test_navigation_end_to_end_offline_replay() {
        let h = harness();
        h.fetcher.respond(&url("/"), "text/html", "<html>gallery</html>");

        let first = expect_served(h.interceptor.handle(&Request::navigate(&url("/")).unwrap()).await);
        assert_eq!(first.served_by, ServedBy::Network);
        assert!(h.storage.match_in(DYNAMIC, &url("/")).await.unwrap().is_some());

        h.fetcher.set_offline(true);
        let second = expect_served(h.interceptor.handle(&Request::navigate(&url("/")).unwrap()).await);
        assert_eq!(second.served_by, ServedBy::Cache);
        assert_eq!(second.response, first.response);
    }

    #[tokio::test]
    async fn test_navigation_deep_link_offline_uses_shell() {
        let h = harness();
        seed_shell(&h).await;
        h.fetcher.set_offline(true);

        let served = expect_served(h.interceptor.handle(&Request::navigate(&url("/characters/12")).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::ShellFallback);
        assert_eq!(&served.response.body[..], b"<shell>");
    }

    #[tokio::test]
    async fn test_navigation_offline_without_shell_is_unresolved() {
        let h = harness();
        h.fetcher.set_offline(true);

        let outcome = h.interceptor.handle(&Request::navigate(&url("/")).unwrap()).await;
        assert!(matches!(outcome, Outcome::Unresolved(Classification::Navigation)));
    }

    #[tokio::test]
    async fn test_same_origin_cache_first_without_revalidation() {
        let h = harness();
        let css = url("/styles.css");
        h.storage
            .put(DYNAMIC, &css, &HttpResponse::new(css.clone(), 200, Vec::new(), "body{}"))
            .await
            .unwrap();
        h.fetcher.respond(&css, "text/css", "body{color:red}");

        let served = expect_served(h.interceptor.handle(&Request::get(&css).unwrap()).await);
        assert_eq!(served.classification, Classification::SameOriginOther);
        assert_eq!(served.served_by, ServedBy::Cache);
        assert_eq!(&served.response.body[..], b"body{}");
        assert_eq!(h.fetcher.total_calls(), 0);
        assert_eq!(h.interceptor.revalidation().attempts(), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_served_and_mirrored() {
        let h = harness();
        let missing = url("/missing.js");
        h.fetcher.respond_status(&missing, 404, "text/plain", "not found");

        let served = expect_served(h.interceptor.handle(&Request::get(&missing).unwrap()).await);
        assert_eq!(served.served_by, ServedBy::Network);
        assert_eq!(served.response.status, 404);
        assert!(h.storage.match_in(DYNAMIC, &missing).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_post_never_touches_stores() {
        let h = harness();
        seed_shell(&h).await;
        for target in [url("/rooster.json"), url("/"), "https://images.start.gg/a.png".to_string()] {
            let request = Request::navigate(&target).unwrap().with_method(Method::POST);
            let outcome = h.interceptor.handle(&request).await;
            assert!(matches!(outcome, Outcome::PassThrough(Classification::Unhandled)));
            assert!(h.storage.match_in(DYNAMIC, &target).await.unwrap().is_none());
        }
        assert_eq!(h.fetcher.total_calls(), 0);
        assert_eq!(h.storage.entry_count(DYNAMIC).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cross_origin_non_image_passes_through() {
        let h = harness();
        let outcome = h.interceptor.handle(&Request::get("https://fonts.example.com/a.woff2").unwrap()).await;
        assert!(matches!(outcome, Outcome::PassThrough(Classification::Unhandled)));
        assert_eq!(h.fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_store_single_entry() {
        let h = harness();
        h.fetcher.respond(&url("/script.js"), "text/javascript", "js");
        let request = Request::get(&url("/script.js")).unwrap();

        let (a, b) = tokio::join!(h.interceptor.handle(&request), h.interceptor.handle(&request));
        assert!(a.served().is_some() && b.served().is_some());
        assert!(h.fetcher.calls(&url("/script.js")) >= 1);
        assert_eq!(h.storage.entry_count(DYNAMIC).await.unwrap(), 1);
    }
}
