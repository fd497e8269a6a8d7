//! formhost core: transport-agnostic primitives shared by the host and client.
//!
//! This crate defines the data model for published forms, the error surface,
//! and the pure security predicates (proxy path validation, origin matching,
//! dashboard query extraction). It carries no runtime or HTTP dependencies so
//! the predicates can be tested and reused without a server.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Hostile input
//! (paths, referrers, query strings) is reported as `FormHostError` or as a
//! plain `false`/`None`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod dashboard;
pub mod error;
pub mod model;
pub mod security;

/// Shared result type.
pub use error::{FormHostError, FormLoadError, LoadFailure, Result};
