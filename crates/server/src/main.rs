//! rostercache server entry point.
//!
//! Boots the caching agent, registers it, and serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use rostercache_client::{Agent, FetchClient, FetchConfig};
use rostercache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(scope = %config.scope, db = %config.db_path.display(), "Starting rostercache on stdio transport");

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let fetcher = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let agent = Arc::new(Agent::new(&config, storage, fetcher)?);

    match agent.register().await {
        Ok(registration) => tracing::info!(
            cached = registration.install.cached,
            deleted = registration.activation.deleted.len(),
            "agent registered"
        ),
        Err(e) => tracing::warn!(error = %e, "registration failed; requests pass through until shell_register succeeds"),
    }

    let handler = handler::RosterCacheServer::new(agent);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
