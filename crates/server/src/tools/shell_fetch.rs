//! shell_fetch tool implementation.
//!
//! Offers one request to the agent and reports how it was answered. Requests
//! the agent does not intercept go straight to the network.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use rostercache_client::{Agent, Destination, Outcome, Request, parse_method};
use rostercache_core::{Error, HttpResponse};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for the shell_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchParams {
    /// Absolute URL the page is reading.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Whether this is a top-level page navigation.
    #[serde(default)]
    pub navigate: bool,

    /// Destination hint: "document", "image", "script", "style", "font",
    /// "manifest" or empty.
    #[serde(default)]
    pub destination: Option<String>,

    /// Include the body as text when it is valid UTF-8 (default: true).
    #[serde(default = "default_true")]
    pub include_body: bool,
}

fn default_method() -> String {
    "GET".into()
}

fn default_true() -> bool {
    true
}

/// Output structure for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchOutput {
    /// The canonical request URL.
    pub url: String,
    /// Request class: navigation, manifest-data, image-asset,
    /// same-origin-other or unhandled.
    pub classification: String,
    /// Which path answered: cache, network, shell_fallback, synthesized
    /// or pass_through.
    pub served_by: String,
    /// HTTP status of the returned response.
    pub status: u16,
    /// Content-Type header of the returned response.
    pub content_type: Option<String>,
    /// Body size in bytes.
    pub bytes: usize,
    /// Body as text, when requested and valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ShellFetchOutput {
    fn new(
        url: String, classification: &str, served_by: &str, response: &HttpResponse, include_body: bool,
    ) -> Self {
        let body = include_body
            .then(|| std::str::from_utf8(&response.body).ok().map(str::to_owned))
            .flatten();
        Self {
            url,
            classification: classification.to_string(),
            served_by: served_by.to_string(),
            status: response.status,
            content_type: response.content_type().map(str::to_owned),
            bytes: response.body.len(),
            body,
        }
    }
}

pub(crate) fn build_request(params: &ShellFetchParams) -> Result<Request, Error> {
    let method = parse_method(&params.method)?;
    let base = if params.navigate { Request::navigate(&params.url)? } else { Request::get(&params.url)? };
    let request = match params.destination.as_deref() {
        Some(hint) => base.with_destination(hint.parse::<Destination>()?),
        None => base,
    };
    Ok(request.with_method(method))
}

/// Implementation of the shell_fetch tool.
pub async fn fetch_impl(agent: &Agent, params: ShellFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(&params)?;
    let url = request.url.to_string();

    let output = match agent.handle(&request).await {
        Outcome::Served(served) => ShellFetchOutput::new(
            url,
            served.classification.as_str(),
            served.served_by.as_str(),
            &served.response,
            params.include_body,
        ),
        Outcome::PassThrough(classification) => {
            let response = agent.fetcher().fetch(&request).await?;
            ShellFetchOutput::new(url, classification.as_str(), "pass_through", &response, params.include_body)
        }
        Outcome::Unresolved(classification) => {
            return Err(Error::CacheMiss(format!(
                "{url} ({}): network unavailable and nothing cached",
                classification.as_str()
            ))
            .into());
        }
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{ORIGIN, output_json, registered_agent};

    fn params(url: &str) -> ShellFetchParams {
        ShellFetchParams { url: url.into(), method: "GET".into(), include_body: true, ..Default::default() }
    }

    #[test]
    fn test_build_request_navigation() {
        let request = build_request(&ShellFetchParams { navigate: true, ..params(ORIGIN) }).unwrap();
        assert!(request.navigate);
        assert_eq!(request.destination, Destination::Document);
    }

    #[test]
    fn test_build_request_rejects_unknown_destination() {
        let result = build_request(&ShellFetchParams { destination: Some("video".into()), ..params(ORIGIN) });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_manifest_served_from_network() {
        let (agent, _fetcher) = registered_agent().await;

        let result = fetch_impl(&agent, params(&format!("{ORIGIN}/rooster.json"))).await.unwrap();
        let output: ShellFetchOutput = output_json(&result);
        assert_eq!(output.classification, "manifest-data");
        assert_eq!(output.served_by, "network");
        assert_eq!(output.body.as_deref(), Some(r#"[{"id":1}]"#));
    }

    #[tokio::test]
    async fn test_offline_manifest_synthesizes_empty_list() {
        let (agent, fetcher) = registered_agent().await;
        fetcher.set_offline(true);

        let result = fetch_impl(&agent, params(&format!("{ORIGIN}/rooster.json"))).await.unwrap();
        let output: ShellFetchOutput = output_json(&result);
        assert_eq!(output.served_by, "synthesized");
        assert_eq!(output.body.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_post_passes_through() {
        let (agent, _fetcher) = registered_agent().await;
        let request = ShellFetchParams { method: "post".into(), ..params(&format!("{ORIGIN}/rooster.json")) };

        let result = fetch_impl(&agent, request).await.unwrap();
        let output: ShellFetchOutput = output_json(&result);
        assert_eq!(output.classification, "unhandled");
        assert_eq!(output.served_by, "pass_through");
        assert!(agent.storage().match_any(&format!("{ORIGIN}/rooster.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unresolved_is_an_error() {
        let (agent, fetcher) = registered_agent().await;
        fetcher.set_offline(true);
        agent.storage().delete("app-static-v1").await.unwrap();

        let result = fetch_impl(&agent, ShellFetchParams { navigate: true, ..params(&format!("{ORIGIN}/about")) }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let (agent, _fetcher) = registered_agent().await;
        assert!(fetch_impl(&agent, params("not a url")).await.is_err());
    }
}
