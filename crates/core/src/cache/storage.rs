//! The injected cache storage handle.
//!
//! Both the interceptor and the warmer receive an `Arc<dyn CacheStorage>`
//! rather than reaching for ambient global state. Every operation is keyed
//! by the URL of a GET request; there is no way to store any other method.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::connection::CacheDb;
use super::response::HttpResponse;
use crate::Error;

/// Name and size of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
}

/// Named key-response stores shared by every component of the agent.
///
/// Concurrent writes to the same key are last-write-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if it does not exist.
    async fn open(&self, store: &str) -> Result<(), Error>;

    async fn has(&self, store: &str) -> Result<bool, Error>;

    /// Store names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store with all its entries. Returns false if it was absent.
    async fn delete(&self, store: &str) -> Result<bool, Error>;

    /// Entry for a GET of `url` in `store`.
    async fn match_in(&self, store: &str, url: &str) -> Result<Option<HttpResponse>, Error>;

    /// Entry for a GET of `url` in any store, oldest store first.
    async fn match_any(&self, url: &str) -> Result<Option<HttpResponse>, Error>;

    /// Insert or overwrite, creating the store on demand.
    async fn put(&self, store: &str, url: &str, response: &HttpResponse) -> Result<(), Error>;

    /// Write all entries or none of them.
    async fn put_all(&self, store: &str, entries: &[(String, HttpResponse)]) -> Result<(), Error>;

    async fn entry_count(&self, store: &str) -> Result<u64, Error>;

    /// Every store with its entry count.
    async fn summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        let mut summaries = Vec::new();
        for name in self.keys().await? {
            let entries = self.entry_count(&name).await?;
            summaries.push(StoreSummary { name, entries });
        }
        Ok(summaries)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, store: &str) -> Result<(), Error> {
        self.open_store(store).await
    }

    async fn has(&self, store: &str) -> Result<bool, Error> {
        self.has_store(store).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        self.delete_store(store).await
    }

    async fn match_in(&self, store: &str, url: &str) -> Result<Option<HttpResponse>, Error> {
        self.get_entry(store, url).await
    }

    async fn match_any(&self, url: &str) -> Result<Option<HttpResponse>, Error> {
        self.find_entry(url).await
    }

    async fn put(&self, store: &str, url: &str, response: &HttpResponse) -> Result<(), Error> {
        self.put_entry(store, url, response).await
    }

    async fn put_all(&self, store: &str, entries: &[(String, HttpResponse)]) -> Result<(), Error> {
        self.put_entries(store, entries).await
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        self.count_entries(store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_summaries_through_trait_object() {
        let storage: Arc<dyn CacheStorage> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        storage.open("app-static-v1").await.unwrap();
        storage
            .put("app-dynamic-v1", "http://localhost/", &HttpResponse::new("http://localhost/", 200, Vec::new(), "<html>"))
            .await
            .unwrap();

        let summaries = storage.summaries().await.unwrap();
        assert_eq!(
            summaries,
            vec![
                StoreSummary { name: "app-static-v1".into(), entries: 0 },
                StoreSummary { name: "app-dynamic-v1".into(), entries: 1 },
            ]
        );
    }
}
