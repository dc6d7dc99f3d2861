//! Install and activate hooks, plus the add-to-cache primitive they share
//! with the warmer.
//!
//! Install populates the static store with the shell assets in one
//! transaction, or not at all. Activate deletes every store whose name the
//! running version does not know.

use std::sync::Arc;

use rostercache_core::{CacheStorage, Error, HttpResponse};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Fetcher, cache_key};
use crate::request::Request;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub store: String,
    pub cached: usize,
}

/// Result of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stores removed because their names are no longer known.
    pub deleted: Vec<String>,
    /// Stores left in place.
    pub kept: Vec<String>,
}

/// Fetch `url` for storage; a non-2xx status counts as a failure.
pub async fn fetch_for_cache(fetcher: &dyn Fetcher, url: &Url) -> Result<HttpResponse, Error> {
    let request = Request::get(url.as_str())?;
    let response = fetcher.fetch(&request).await?;
    if !response.is_ok() {
        return Err(Error::HttpError(format!("status {} for {}", response.status, url)));
    }
    Ok(response)
}

/// Fetch `url` and store the response in `store`.
pub async fn add(storage: &dyn CacheStorage, fetcher: &dyn Fetcher, store: &str, url: &Url) -> Result<(), Error> {
    let response = fetch_for_cache(fetcher, url).await?;
    storage.put(store, &cache_key(url), &response).await
}

/// Populate `store` with every asset, or leave storage untouched.
///
/// All assets are fetched concurrently; the store is written only after all
/// of them succeeded. The reported failure is the first failing asset in
/// manifest order.
pub async fn install(
    storage: &dyn CacheStorage, fetcher: Arc<dyn Fetcher>, store: &str, assets: &[Url],
) -> Result<InstallReport, Error> {
    let mut join_set = JoinSet::new();
    for (idx, url) in assets.iter().cloned().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        join_set.spawn(async move {
            let result = fetch_for_cache(fetcher.as_ref(), &url).await;
            (idx, url, result)
        });
    }

    let mut fetched: Vec<Option<Result<HttpResponse, Error>>> = assets.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (idx, url, result) =
            joined.map_err(|e| Error::InstallFailed { url: "<task>".into(), reason: e.to_string() })?;
        if let Err(e) = &result {
            tracing::warn!(%url, error = %e, "shell asset fetch failed");
        }
        fetched[idx] = Some(result);
    }

    let mut entries = Vec::with_capacity(assets.len());
    for (url, result) in assets.iter().zip(fetched) {
        match result {
            Some(Ok(response)) => entries.push((cache_key(url), response)),
            Some(Err(e)) => return Err(Error::InstallFailed { url: url.to_string(), reason: e.to_string() }),
            None => return Err(Error::InstallFailed { url: url.to_string(), reason: "fetch did not finish".into() }),
        }
    }

    storage.put_all(store, &entries).await?;
    tracing::info!(store, cached = entries.len(), "static store populated");

    Ok(InstallReport { store: store.to_string(), cached: entries.len() })
}

/// Delete every store not named in `known`.
pub async fn activate(storage: &dyn CacheStorage, known: &[&str]) -> Result<ActivationReport, Error> {
    let mut report = ActivationReport::default();
    for name in storage.keys().await? {
        if known.contains(&name.as_str()) {
            report.kept.push(name);
        } else {
            storage.delete(&name).await?;
            tracing::info!(store = %name, "deleted stale store");
            report.deleted.push(name);
        }
    }
    Ok(report)
}
