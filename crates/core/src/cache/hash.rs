//! Request identity keys.

use sha2::{Digest, Sha256};

use crate::Request;

/// Compute the key a request is stored under: method plus absolute URL.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Key for an intercepted request.
pub fn request_key(request: &Request) -> String {
    compute_entry_key(&request.method, request.url.as_str())
}
