//! Embedding policy (iframe origin allow-list).
//!
//! Compiles the configured allow-list once at startup; each request is then
//! checked against the compiled rules.

pub mod allowlist;
pub mod iframe;

pub use allowlist::OriginAllowList;
pub use iframe::{FrameContext, IframeOriginGate};
