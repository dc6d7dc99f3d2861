//! shell_register tool implementation.
//!
//! Re-runs install and activation, e.g. after the shell changed on the origin
//! or after a failed install at startup.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use rostercache_client::Agent;
use rostercache_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output structure for the shell_register tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellRegisterOutput {
    /// Agent state after registration.
    pub state: String,
    /// Name of the static store.
    pub static_store: String,
    /// Shell assets written to the static store.
    pub cached: usize,
    /// Stores deleted during activation.
    pub deleted: Vec<String>,
}

/// Implementation of the shell_register tool.
pub async fn register_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let registration = agent.register().await?;

    let output = ShellRegisterOutput {
        state: agent.state().await.to_string(),
        static_store: registration.install.store,
        cached: registration.install.cached,
        deleted: registration.activation.deleted,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
