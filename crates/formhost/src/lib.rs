//! Top-level facade crate for formhost.
//!
//! Re-exports the core model, the gateway library and the client call
//! wrapper so users can depend on a single crate.

pub mod core {
    pub use formhost_core::*;
}

pub mod gateway {
    pub use formhost_gateway::*;
}

pub mod client {
    pub use formhost_client::*;
}
