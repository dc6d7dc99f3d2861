//! Request classification and the routing policy table.
//!
//! Classification is a pure function of the request and the scope. Each
//! class maps to exactly one [`Strategy`]; that mapping lives in
//! [`Classification::strategy`] and nowhere else.

use reqwest::Method;
use serde::Serialize;

use crate::request::{Destination, Request};
use crate::scope::Scope;

/// What kind of read the page issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Top-level page load.
    Navigation,
    /// The catalog JSON.
    ManifestData,
    /// A portrait or other image.
    ImageAsset,
    /// Any other same-origin read.
    SameOriginOther,
    /// Writes and cross-origin non-image reads.
    Unhandled,
}

/// How a class of request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Dynamic store, then network, then the shell document.
    CacheFirst,
    /// Like `CacheFirst`, and a cache hit also refreshes the entry in the background.
    CacheFirstRevalidate,
    /// Network, then dynamic store, then an empty JSON list.
    NetworkFirst,
    /// Not intercepted.
    PassThrough,
}

impl Classification {
    pub fn strategy(self) -> Strategy {
        match self {
            Classification::Navigation => Strategy::CacheFirst,
            Classification::ManifestData => Strategy::NetworkFirst,
            Classification::ImageAsset => Strategy::CacheFirstRevalidate,
            Classification::SameOriginOther => Strategy::CacheFirst,
            Classification::Unhandled => Strategy::PassThrough,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Navigation => "navigation",
            Classification::ManifestData => "manifest-data",
            Classification::ImageAsset => "image-asset",
            Classification::SameOriginOther => "same-origin-other",
            Classification::Unhandled => "unhandled",
        }
    }
}

/// Classify a request. Rules are checked in order; the first match wins.
pub fn classify(request: &Request, scope: &Scope) -> Classification {
    if request.method != Method::GET {
        return Classification::Unhandled;
    }

    if request.navigate {
        Classification::Navigation
    } else if scope.is_manifest(&request.url) {
        Classification::ManifestData
    } else if request.destination == Destination::Image || scope.is_image_host(&request.url) {
        Classification::ImageAsset
    } else if scope.is_same_origin(&request.url) {
        Classification::SameOriginOther
    } else {
        Classification::Unhandled
    }
}
