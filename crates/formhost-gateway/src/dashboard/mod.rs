//! Dashboard token handshake.
//!
//! Navigation from the external dashboard carries an encrypted token. The
//! host never decrypts it; a backend verifies it and resolves the session
//! parameters. Every outcome, including transport failure, comes back as a
//! `TokenValidation` value.

pub mod validator;

pub use validator::{DashboardTokenValidator, VALIDATE_TOKEN_PATH};
