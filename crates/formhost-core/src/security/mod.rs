//! Pure security predicates used at the host's trust boundaries.
//!
//! - `path`: destination path validation for the reverse proxy (SSRF guard).
//! - `origin`: embedding-origin matching and referrer-to-origin resolution.
//!
//! Both are panic-free and allocation-light so they can run before any other
//! request handling.

pub mod origin;
pub mod path;

pub use origin::{origin_matches, parent_origin_from_referrer};
pub use path::validate_proxy_path;
