//! Request identity keys.

use sha2::{Digest, Sha256};

/// The only method whose responses are ever stored.
pub const CACHEABLE_METHOD: &str = "GET";

/// Compute the store key for a GET request to `url`.
///
/// `url` is expected in canonical form; headers do not take part in the key.
pub fn compute_request_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CACHEABLE_METHOD.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
