//! In-memory cache storage.
//!
//! Same observable behavior as [`CacheDb`](super::CacheDb) without a file:
//! stores keep creation order and vanish with the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::compute_request_key;
use super::response::HttpResponse;
use super::storage::CacheStorage;
use crate::Error;

type Store = HashMap<String, HttpResponse>;

/// In-memory implementation of [`CacheStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<Vec<(String, Store)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn store_mut<'a>(stores: &'a mut Vec<(String, Store)>, name: &str) -> &'a mut Store {
    let idx = match stores.iter().position(|(n, _)| n == name) {
        Some(idx) => idx,
        None => {
            stores.push((name.to_string(), Store::new()));
            stores.len() - 1
        }
    };
    &mut stores[idx].1
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, store: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        store_mut(&mut stores, store);
        Ok(())
    }

    async fn has(&self, store: &str) -> Result<bool, Error> {
        Ok(self.stores.read().await.iter().any(|(n, _)| n == store))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.read().await.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(n, _)| n != store);
        Ok(stores.len() != before)
    }

    async fn match_in(&self, store: &str, url: &str) -> Result<Option<HttpResponse>, Error> {
        let key = compute_request_key(url);
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == store)
            .and_then(|(_, entries)| entries.get(&key))
            .cloned())
    }

    async fn match_any(&self, url: &str) -> Result<Option<HttpResponse>, Error> {
        let key = compute_request_key(url);
        let stores = self.stores.read().await;
        Ok(stores.iter().find_map(|(_, entries)| entries.get(&key)).cloned())
    }

    async fn put(&self, store: &str, url: &str, response: &HttpResponse) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        store_mut(&mut stores, store).insert(compute_request_key(url), response.clone());
        Ok(())
    }

    async fn put_all(&self, store: &str, entries: &[(String, HttpResponse)]) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let target = store_mut(&mut stores, store);
        for (url, response) in entries {
            target.insert(compute_request_key(url), response.clone());
        }
        Ok(())
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(n, _)| n == store)
            .map_or(0, |(_, entries)| entries.len() as u64))
    }
}
