//! Proxy destination path validation.
//!
//! The upstream host is fixed server-side; only the path is attacker
//! influenced. A path is accepted only when every `/`-separated segment is
//! non-empty, free of `..`, not itself a URL, and made of `[A-Za-z0-9._-]`.

use crate::error::{FormHostError, Result};

fn allowed_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'/')
}

/// Validate a proxy path (without leading `/proxy/`).
///
/// Error messages name the rejected path and the broken rule only.
pub fn validate_proxy_path(path: &str) -> Result<()> {
    let reject = |why: &str| {
        tracing::debug!(path = ?path, reason = why, "proxy path rejected");
        Err(FormHostError::InvalidPath(format!("{why}: {path:?}")))
    };

    if path.is_empty() {
        return reject("empty path");
    }
    if path.chars().any(char::is_control) {
        return reject("control character");
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return reject("empty segment");
        }
        if segment.contains("..") {
            return reject("parent traversal");
        }
        let lower = segment.to_ascii_lowercase();
        if lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") {
            return reject("absolute url segment");
        }
    }

    if !path.bytes().all(allowed_byte) {
        return reject("disallowed character");
    }

    Ok(())
}
