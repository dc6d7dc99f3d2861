//! Pending request descriptions as the page issues them.

use std::fmt;
use std::str::FromStr;

pub use reqwest::Method;
use rostercache_core::Error;
use serde::Serialize;
use url::Url;

use crate::fetch::canonicalize;

/// The kind of resource the page expects, as reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// No hint (e.g. a script-initiated fetch).
    #[default]
    Empty,
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Empty => "",
            Destination::Document => "document",
            Destination::Image => "image",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
        }
    }

    /// Accept header a browser would send for this destination.
    pub fn accept(&self) -> &'static str {
        match self {
            Destination::Document => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            Destination::Image => "image/avif,image/webp,image/png,image/*;q=0.8,*/*;q=0.5",
            Destination::Style => "text/css,*/*;q=0.1",
            Destination::Manifest => "application/manifest+json,application/json;q=0.9,*/*;q=0.5",
            Destination::Empty | Destination::Script | Destination::Font => "*/*",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Ok(Destination::Empty),
            "document" => Ok(Destination::Document),
            "image" => Ok(Destination::Image),
            "script" => Ok(Destination::Script),
            "style" => Ok(Destination::Style),
            "font" => Ok(Destination::Font),
            "manifest" => Ok(Destination::Manifest),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// Parse an HTTP method name, case-insensitively.
pub fn parse_method(name: &str) -> Result<Method, Error> {
    let upper = name.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(Error::InvalidInput("empty method".into()));
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| Error::InvalidInput(format!("invalid method: {name}")))
}

/// A request intercepted on its way to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL without fragment.
    pub url: Url,
    /// Whether this is a top-level page navigation.
    pub navigate: bool,
    pub destination: Destination,
}

impl Request {
    /// A plain GET with no destination hint.
    pub fn get(url: &str) -> Result<Self, Error> {
        Ok(Self { method: Method::GET, url: canonicalize(url)?, navigate: false, destination: Destination::Empty })
    }

    /// A top-level navigation to `url`.
    pub fn navigate(url: &str) -> Result<Self, Error> {
        Ok(Self { navigate: true, destination: Destination::Document, ..Self::get(url)? })
    }

    /// An image load, e.g. from an `<img>` element.
    pub fn image(url: &str) -> Result<Self, Error> {
        Ok(Self { destination: Destination::Image, ..Self::get(url)? })
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }
}
