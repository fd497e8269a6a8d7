//! Client call wrapper for pages served by the form host.
//!
//! Attaches the session credential to outbound calls, disables caching, and
//! reacts to an expired session by clearing tenant-scoped storage and
//! sending the user back to login.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod guard;
pub mod scope;
pub mod storage;

pub use guard::{GuardRoutes, SessionGuard};
pub use scope::SessionScope;
pub use storage::{CredentialStorage, MemoryStorage, Navigator};
