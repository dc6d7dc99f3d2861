//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the caching agent.
use std::sync::Arc;

use crate::tools::{
    ShellFetchParams, ShellWarmParams, cache::stores_impl, fetch_impl, register_impl, warm_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use rostercache_client::Agent;

/// The MCP server handler for rostercache.
#[derive(Clone)]
pub struct RosterCacheServer {
    agent: Arc<Agent>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl RosterCacheServer {
    /// Create a new server handler around an agent.
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent, tool_router: Self::tool_router() }
    }

    /// Offer a request to the caching agent.
    ///
    /// Intercepted requests are answered from cache, network, the shell document or a
    /// synthesized body; everything else is fetched normally.
    #[tool(
        description = "Fetch a URL through the offline caching agent. Reports the request classification and whether the cache, the network, the shell fallback or a synthesized body answered."
    )]
    async fn shell_fetch(&self, params: Parameters<ShellFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, params.0).await
    }

    #[tool(
        description = "Warm the dynamic cache with the shell assets and the given image URLs. Returns success and failure counts plus a display string."
    )]
    async fn shell_warm(&self, params: Parameters<ShellWarmParams>) -> Result<CallToolResult, McpError> {
        warm_impl(&self.agent, params.0).await
    }

    #[tool(description = "Install the shell into the static cache and activate the agent, deleting stale caches.")]
    async fn shell_register(&self) -> Result<CallToolResult, McpError> {
        register_impl(&self.agent).await
    }

    #[tool(description = "List cache stores with their entry counts and the agent's lifecycle state.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.agent).await
    }
}

impl ServerHandler for RosterCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "rostercache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
