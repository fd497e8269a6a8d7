//! Secure reverse proxy to the internal business-process API.
//!
//! Order of operations per request:
//! 1. validate the destination path (the only SSRF defense; host is fixed)
//! 2. answer `OPTIONS` preflight directly
//! 3. rewrite credentials and forward, mirroring status and content type
//!
//! Every response, including rejections, carries permissive CORS headers.

pub mod forward;
pub mod headers;

pub use forward::{proxy_handler, SecureProxyGateway, PROXY_PREFIX};
pub use headers::{apply_cors, redact_authorization, rewrite_authorization};
