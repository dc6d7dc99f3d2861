//! Shared fixtures for the tool tests.

use std::sync::Arc;

use rmcp::model::CallToolResult;
use rostercache_client::Agent;
use rostercache_client::testing::ScriptedFetcher;
use rostercache_core::{AppConfig, MemoryStorage};
use serde::de::DeserializeOwned;

pub const ORIGIN: &str = "http://127.0.0.1:8080";

/// Scripted network serving the default shell and a one-entry catalog.
pub fn shell_network() -> Arc<ScriptedFetcher> {
    let fetcher = Arc::new(ScriptedFetcher::new());
    for (path, content_type, body) in [
        ("/", "text/html", "<shell>"),
        ("/index.html", "text/html", "<shell>"),
        ("/styles.css", "text/css", "body{}"),
        ("/script.js", "text/javascript", "init()"),
        ("/manifest.webmanifest", "application/manifest+json", "{}"),
        ("/rooster.json", "application/json", r#"[{"id":1}]"#),
    ] {
        fetcher.respond(&format!("{ORIGIN}{path}"), content_type, body);
    }
    fetcher
}

pub fn agent(fetcher: Arc<ScriptedFetcher>) -> Arc<Agent> {
    Arc::new(Agent::new(&AppConfig::default(), Arc::new(MemoryStorage::new()), fetcher).unwrap())
}

/// An activated agent over in-memory storage.
pub async fn registered_agent() -> (Arc<Agent>, Arc<ScriptedFetcher>) {
    let fetcher = shell_network();
    let agent = agent(fetcher.clone());
    agent.register().await.unwrap();
    (agent, fetcher)
}

/// Decode the JSON text of a tool result.
pub fn output_json<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap();
    serde_json::from_str(&text).unwrap()
}
