//! The caching agent: lifecycle state plus the components it drives.
//!
//! An agent starts `Parsed` and intercepts nothing. [`Agent::register`]
//! installs the shell into the static store and, on success, activates right
//! away. Only an `Activated` agent routes requests through the interceptor.

use std::fmt;
use std::sync::Arc;

use rostercache_core::{AppConfig, CacheStorage, Error};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::classify::classify;
use crate::fetch::Fetcher;
use crate::lifecycle::{self, ActivationReport, InstallReport};
use crate::request::Request;
use crate::scope::Scope;
use crate::strategy::{Interceptor, Outcome};
use crate::warm::{WarmReport, Warmer, working_set};

/// Lifecycle position of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// The last install failed; nothing is intercepted.
    Redundant,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Parsed => "parsed",
            AgentState::Installing => "installing",
            AgentState::Installed => "installed",
            AgentState::Activating => "activating",
            AgentState::Activated => "activated",
            AgentState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful [`Agent::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub install: InstallReport,
    pub activation: ActivationReport,
}

pub struct Agent {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    scope: Arc<Scope>,
    static_cache: String,
    dynamic_cache: String,
    shell_assets: Vec<Url>,
    warm_assets: Vec<String>,
    interceptor: Interceptor,
    warmer: Warmer,
    state: RwLock<AgentState>,
    // Serializes install and activate.
    lifecycle: Mutex<()>,
}

impl Agent {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let scope = Arc::new(Scope::from_config(config)?);
        let shell_assets = scope.resolve_all(&config.shell_assets)?;

        let interceptor =
            Interceptor::new(Arc::clone(&storage), Arc::clone(&fetcher), Arc::clone(&scope), &config.dynamic_cache);
        let warmer =
            Warmer::new(Arc::clone(&storage), Arc::clone(&fetcher), &config.dynamic_cache, config.warm_concurrency);

        Ok(Self {
            storage,
            fetcher,
            scope,
            static_cache: config.static_cache.clone(),
            dynamic_cache: config.dynamic_cache.clone(),
            shell_assets,
            warm_assets: config.warm_assets.clone(),
            interceptor,
            warmer,
            state: RwLock::new(AgentState::Parsed),
            lifecycle: Mutex::new(()),
        })
    }

    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn shell_assets(&self) -> &[Url] {
        &self.shell_assets
    }

    /// Install and, if that succeeds, activate immediately.
    pub async fn register(&self) -> Result<Registration, Error> {
        let _guard = self.lifecycle.lock().await;
        let install = self.run_install().await?;
        let activation = self.run_activate().await?;
        Ok(Registration { install, activation })
    }

    /// Populate the static store with the shell assets.
    ///
    /// On failure a fresh agent becomes `Redundant`; an already active agent
    /// stays active with its previous static store.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let _guard = self.lifecycle.lock().await;
        self.run_install().await
    }

    /// Delete stale stores and start intercepting. Requires a completed install.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let _guard = self.lifecycle.lock().await;
        self.run_activate().await
    }

    async fn run_install(&self) -> Result<InstallReport, Error> {
        let previous = self.state().await;
        if previous != AgentState::Activated {
            self.set_state(AgentState::Installing).await;
        }

        match lifecycle::install(self.storage.as_ref(), Arc::clone(&self.fetcher), &self.static_cache, &self.shell_assets)
            .await
        {
            Ok(report) => {
                if previous != AgentState::Activated {
                    self.set_state(AgentState::Installed).await;
                }
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(store = %self.static_cache, error = %e, "install failed");
                if previous != AgentState::Activated {
                    self.set_state(AgentState::Redundant).await;
                }
                Err(e)
            }
        }
    }

    async fn run_activate(&self) -> Result<ActivationReport, Error> {
        let previous = self.state().await;
        if !matches!(previous, AgentState::Installed | AgentState::Activated) {
            return Err(Error::Lifecycle(format!("cannot activate from state '{previous}'")));
        }

        self.set_state(AgentState::Activating).await;
        let known = [self.static_cache.as_str(), self.dynamic_cache.as_str()];
        match lifecycle::activate(self.storage.as_ref(), &known).await {
            Ok(report) => {
                self.set_state(AgentState::Activated).await;
                Ok(report)
            }
            Err(e) => {
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn set_state(&self, next: AgentState) {
        let mut state = self.state.write().await;
        let from = *state;
        if from != next {
            tracing::info!(%from, to = %next, "agent state changed");
            *state = next;
        }
    }

    /// Offer a request to the agent. Nothing is intercepted before activation.
    pub async fn handle(&self, request: &Request) -> Outcome {
        if self.state().await != AgentState::Activated {
            return Outcome::PassThrough(classify(request, &self.scope));
        }
        self.interceptor.handle(request).await
    }

    /// Warm the shell assets plus the images currently on the page.
    pub async fn warm_visible<S: AsRef<str>>(&self, image_urls: &[S]) -> WarmReport {
        let urls = working_set(&self.scope, &self.warm_assets, image_urls);
        self.warmer.warm(&urls).await
    }

    /// Warm an explicit list of URLs.
    pub async fn warm<S: AsRef<str>>(&self, urls: &[S]) -> WarmReport {
        self.warmer.warm(urls).await
    }
}
