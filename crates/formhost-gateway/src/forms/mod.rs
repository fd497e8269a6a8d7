//! Form-facing HTTP handlers.
//!
//! The standalone route runs the full embedding pipeline: origin gate,
//! dashboard token (advisory), registry status, load, render.

pub mod handlers;

pub use handlers::{list_forms, standalone_form, FormQuery};
