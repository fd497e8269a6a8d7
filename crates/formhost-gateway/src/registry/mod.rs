//! Form metadata registry.
//!
//! Holds the metadata of every published form with TTL-based freshness.
//! Constructed once at startup and shared via `Arc`; tests build isolated
//! instances.

pub mod store;

pub use store::{InitOptions, ModuleRegistry, DEFAULT_TTL};
