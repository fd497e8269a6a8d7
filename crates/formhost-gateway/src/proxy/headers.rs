//! Credential rewrite, log redaction and CORS headers.

use axum::http::{header, HeaderMap, HeaderValue};

/// Translate an inbound `Bearer` credential to the `Basic` scheme the
/// upstream API expects. Other schemes pass through unchanged.
pub fn rewrite_authorization(value: &str) -> String {
    let trimmed = value.trim();
    match trimmed.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => {
            format!("Basic {}", rest.trim())
        }
        _ => trimmed.to_string(),
    }
}

/// Keep the scheme name, drop everything after it.
pub fn redact_authorization(value: &str) -> String {
    let scheme = value.split_whitespace().next().unwrap_or("");
    if scheme.is_empty() {
        "[REDACTED]".to_string()
    } else {
        format!("{scheme} [REDACTED]")
    }
}

pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}
