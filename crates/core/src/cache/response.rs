//! Captured HTTP responses as the stores hold them.

use bytes::Bytes;

/// Content type of the synthesized empty catalog.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A captured response: status, headers and body.
///
/// The body is a reference-counted buffer, so every clone is an independent
/// readable instance of the same bytes. Callers that both return and persist
/// a response hand one clone to each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// URL the response was obtained from (after redirects).
    pub url: String,
    pub status: u16,
    /// Header pairs in arrival order; names are kept as received.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers, body: body.into() }
    }

    /// The `[]` document served when the catalog is unreachable and uncached.
    pub fn empty_json_list(url: impl Into<String>) -> Self {
        Self::new(url, 200, vec![("content-type".into(), JSON_CONTENT_TYPE.into())], Bytes::from_static(b"[]"))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
