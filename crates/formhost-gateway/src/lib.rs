//! formhost gateway library entry.
//!
//! This crate wires the registry, dynamic loader, embedding gate, dashboard
//! token validator and secure proxy into one HTTP host. It is consumed by
//! the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod loader;
pub mod policy;
pub mod proxy;
pub mod registry;
pub mod router;
