//! On-demand population of the dynamic store.
//!
//! The warmer bypasses the interceptor: it fetches every URL of the working
//! set and writes the successful ones straight into the dynamic store. One
//! URL failing never stops the others.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rostercache_core::{CacheStorage, Error};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::{Fetcher, cache_key, canonicalize};
use crate::lifecycle;
use crate::scope::Scope;

/// Success and failure counts of one warm batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl WarmReport {
    /// Short human-readable count for display.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WarmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cached {}", self.succeeded)?;
        if self.failed > 0 {
            write!(f, " (+{} failed)", self.failed)?;
        }
        Ok(())
    }
}

/// Shell assets resolved against the scope, followed by the page's image URLs.
///
/// Entries that cannot be resolved are passed through unchanged so the warm
/// batch counts them as failures.
pub fn working_set<A: AsRef<str>, I: AsRef<str>>(scope: &Scope, warm_assets: &[A], image_urls: &[I]) -> Vec<String> {
    warm_assets
        .iter()
        .map(AsRef::as_ref)
        .chain(image_urls.iter().map(AsRef::as_ref))
        .map(|input| match scope.resolve(input) {
            Ok(url) => url.to_string(),
            Err(_) => input.to_string(),
        })
        .collect()
}

/// Writes a working set into one store with bounded parallelism.
pub struct Warmer {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    store: String,
    concurrency: usize,
}

impl Warmer {
    pub fn new(
        storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, store: impl Into<String>, concurrency: usize,
    ) -> Self {
        Self { storage, fetcher, store: store.into(), concurrency: concurrency.max(1) }
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    /// Add every URL to the store and count the outcomes.
    ///
    /// Duplicates (after canonicalization) are fetched once and counted once.
    pub async fn warm<S: AsRef<str>>(&self, urls: &[S]) -> WarmReport {
        let mut report = WarmReport::default();
        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for input in urls {
            match canonicalize(input.as_ref()) {
                Ok(url) => {
                    if seen.insert(cache_key(&url)) {
                        targets.push(url);
                    }
                }
                Err(e) => {
                    tracing::debug!(url = input.as_ref(), error = %e, "skipping invalid warm URL");
                    report.failed += 1;
                }
            }
        }

        if let Err(e) = self.storage.open(&self.store).await {
            tracing::warn!(store = %self.store, error = %e, "cannot open store; nothing warmed");
            report.failed += targets.len();
            return report;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for url in targets {
            let semaphore = Arc::clone(&semaphore);
            let storage = Arc::clone(&self.storage);
            let fetcher = Arc::clone(&self.fetcher);
            let store = self.store.clone();

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Lifecycle(format!("warm batch closed: {e}")))?;
                lifecycle::add(storage.as_ref(), fetcher.as_ref(), &store, &url)
                    .await
                    .inspect_err(|e| tracing::debug!(%url, error = %e, "warm failed"))
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(())) => report.succeeded += 1,
                Ok(Err(_)) => report.failed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "warm task aborted");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(store = %self.store, succeeded = report.succeeded, failed = report.failed, "warm finished");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedFetcher;
    use async_trait::async_trait;
    use rostercache_core::{HttpResponse, MemoryStorage};

    fn warmer(storage: Arc<dyn CacheStorage>, fetcher: Arc<ScriptedFetcher>) -> Warmer {
        Warmer::new(storage, fetcher, "app-dynamic-v1", 4)
    }

    fn scripted() -> Arc<ScriptedFetcher> {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://127.0.0.1:8080/index.html", "text/html", "<shell>");
        fetcher.respond("https://images.start.gg/a.png", "image/png", "png-a");
        fetcher.respond("https://images.start.gg/b.png", "image/png", "png-b");
        fetcher
    }

    #[test]
    fn test_summary_string() {
        assert_eq!(WarmReport { succeeded: 5, failed: 0 }.summary(), "Cached 5");
        assert_eq!(WarmReport { succeeded: 3, failed: 2 }.summary(), "Cached 3 (+2 failed)");
        assert_eq!(WarmReport::default().summary(), "Cached 0");
    }

    #[test]
    fn test_working_set_resolves_assets() {
        let scope =
            Scope::new("http://127.0.0.1:8080/", "index.html", "/rooster.json", vec!["images.start.gg".into()]).unwrap();
        let set = working_set(&scope, &["index.html", "styles.css"], &["https://images.start.gg/a.png"]);
        assert_eq!(
            set,
            vec![
                "http://127.0.0.1:8080/index.html".to_string(),
                "http://127.0.0.1:8080/styles.css".to_string(),
                "https://images.start.gg/a.png".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_warm_all_succeed() {
        let storage = Arc::new(MemoryStorage::new());
        let report = warmer(storage.clone(), scripted())
            .warm(&["http://127.0.0.1:8080/index.html", "https://images.start.gg/a.png"])
            .await;

        assert_eq!(report, WarmReport { succeeded: 2, failed: 0 });
        assert_eq!(storage.entry_count("app-dynamic-v1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_collapse() {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = scripted();
        let report = warmer(storage.clone(), fetcher.clone())
            .warm(&[
                "https://images.start.gg/a.png",
                "https://IMAGES.start.gg/a.png",
                "https://images.start.gg/a.png#top",
            ])
            .await;

        assert_eq!(report, WarmReport { succeeded: 1, failed: 0 });
        assert_eq!(fetcher.calls("https://images.start.gg/a.png"), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = scripted();
        fetcher.fail("https://images.start.gg/b.png");

        let report = warmer(storage.clone(), fetcher)
            .warm(&[
                "https://images.start.gg/a.png",
                "https://images.start.gg/b.png",
                "https://images.start.gg/missing.png",
                "not a url",
            ])
            .await;

        assert_eq!(report, WarmReport { succeeded: 1, failed: 3 });
        assert_eq!(report.summary(), "Cached 1 (+3 failed)");
        assert!(storage.match_in("app-dynamic-v1", "https://images.start.gg/a.png").await.unwrap().is_some());
        assert!(storage.match_in("app-dynamic-v1", "https://images.start.gg/b.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_warm_twice_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let warmer = warmer(storage.clone(), scripted());
        let urls = ["http://127.0.0.1:8080/index.html", "https://images.start.gg/a.png"];

        warmer.warm(&urls).await;
        let first = storage.match_in("app-dynamic-v1", urls[1]).await.unwrap();
        let second_report = warmer.warm(&urls).await;
        let second = storage.match_in("app-dynamic-v1", urls[1]).await.unwrap();

        assert_eq!(second_report.succeeded, 2);
        assert_eq!(first, second);
        assert_eq!(storage.entry_count("app-dynamic-v1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_offline_yields_zero_successes() {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = scripted();
        fetcher.set_offline(true);

        let report = warmer(storage, fetcher).warm(&["https://images.start.gg/a.png"]).await;
        assert_eq!(report, WarmReport { succeeded: 0, failed: 1 });
    }

    /// Storage whose every operation fails.
    struct UnavailableStorage;

    fn unavailable() -> Error {
        Error::MigrationFailed("storage unavailable".into())
    }

    #[async_trait]
    impl CacheStorage for UnavailableStorage {
        async fn open(&self, _: &str) -> Result<(), Error> {
            Err(unavailable())
        }
        async fn has(&self, _: &str) -> Result<bool, Error> {
            Err(unavailable())
        }
        async fn keys(&self) -> Result<Vec<String>, Error> {
            Err(unavailable())
        }
        async fn delete(&self, _: &str) -> Result<bool, Error> {
            Err(unavailable())
        }
        async fn match_in(&self, _: &str, _: &str) -> Result<Option<HttpResponse>, Error> {
            Err(unavailable())
        }
        async fn match_any(&self, _: &str) -> Result<Option<HttpResponse>, Error> {
            Err(unavailable())
        }
        async fn put(&self, _: &str, _: &str, _: &HttpResponse) -> Result<(), Error> {
            Err(unavailable())
        }
        async fn put_all(&self, _: &str, _: &[(String, HttpResponse)]) -> Result<(), Error> {
            Err(unavailable())
        }
        async fn entry_count(&self, _: &str) -> Result<u64, Error> {
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn test_unopenable_store_and_no_network() {
        let fetcher = scripted();
        fetcher.set_offline(true);

        let report = warmer(Arc::new(UnavailableStorage), fetcher.clone())
            .warm(&["https://images.start.gg/a.png", "https://images.start.gg/b.png"])
            .await;

        assert_eq!(report, WarmReport { succeeded: 0, failed: 2 });
        assert_eq!(fetcher.total_calls(), 0);
    }
}
