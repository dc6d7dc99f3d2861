//! cache_stores tool implementation.
//!
//! Lists every store with its entry count, oldest first.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use rostercache_client::Agent;
use rostercache_core::{Error, StoreSummary};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Current lifecycle state of the agent.
    pub state: String,
    /// Stores in creation order.
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let stores = agent.storage().summaries().await?;
    let output = CacheStoresOutput { state: agent.state().await.to_string(), stores };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize stores: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
