//! shell_warm tool implementation.
//!
//! Writes the shell assets and the images the page currently shows into the
//! dynamic store, outside the interception path.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use rostercache_client::Agent;
use rostercache_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the shell_warm tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ShellWarmParams {
    /// URLs of the images currently rendered by the page.
    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Also warm the configured shell assets (default: true).
    #[serde(default = "default_true")]
    pub include_shell: bool,
}

fn default_true() -> bool {
    true
}

/// Output structure for the shell_warm tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellWarmOutput {
    /// URLs written to the dynamic store.
    pub succeeded: usize,
    /// URLs that could not be fetched or stored.
    pub failed: usize,
    /// Display string, e.g. "Cached 12 (+1 failed)".
    pub summary: String,
}

/// Implementation of the shell_warm tool.
///
/// Partial and total failures are reported in the counts, never as an error.
pub async fn warm_impl(agent: &Agent, params: ShellWarmParams) -> Result<CallToolResult, McpError> {
    let report = if params.include_shell {
        agent.warm_visible(&params.image_urls).await
    } else {
        agent.warm(&params.image_urls).await
    };

    let output = ShellWarmOutput { succeeded: report.succeeded, failed: report.failed, summary: report.summary() };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
