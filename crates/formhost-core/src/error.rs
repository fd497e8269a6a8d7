//! Shared error type across formhost crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Proxy destination path rejected.
    InvalidPath,
    /// Embedding origin or other trust check rejected.
    Forbidden,
    /// Credentials missing or expired.
    Unauthorized,
    /// Unknown or inactive form.
    NotFound,
    /// Required configuration missing.
    Configuration,
    /// Remote collaborator failed.
    Upstream,
    /// Form could not be loaded or instantiated.
    FormUnavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidPath => "INVALID_PATH",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Configuration => "CONFIGURATION",
            ClientCode::Upstream => "UPSTREAM",
            ClientCode::FormUnavailable => "FORM_UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FormHostError>;

/// Stage at which loading a form failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// Program text could not be fetched.
    Fetch,
    /// Program text is not a valid module.
    Compile,
    /// Module imports could not be linked against the host interface.
    Instantiate,
    /// Module has no `default` export.
    MalformedModule,
}

impl LoadFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadFailure::Fetch => "fetch",
            LoadFailure::Compile => "compile",
            LoadFailure::Instantiate => "instantiate",
            LoadFailure::MalformedModule => "malformed_module",
        }
    }
}

/// Loader failure. Cloneable so that coalesced waiters share one outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to load form {form} ({}): {message}", .kind.as_str())]
pub struct FormLoadError {
    pub form: String,
    pub kind: LoadFailure,
    pub message: String,
}

impl FormLoadError {
    pub fn new(form: impl Into<String>, kind: LoadFailure, message: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn fetch(form: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(form, LoadFailure::Fetch, message)
    }

    /// Missing default export, naming the form.
    pub fn malformed(form: impl Into<String>) -> Self {
        let form = form.into();
        let message = format!("form '{form}' has no default export");
        Self::new(form, LoadFailure::MalformedModule, message)
    }

    pub fn is_malformed(&self) -> bool {
        self.kind == LoadFailure::MalformedModule
    }
}

/// Unified error type used by core, gateway and client.
#[derive(Debug, Error)]
pub enum FormHostError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("origin rejected: {0}")]
    OriginRejected(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),
    #[error(transparent)]
    FormLoad(#[from] FormLoadError),
    #[error("internal: {0}")]
    Internal(String),
}

impl FormHostError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            FormHostError::BadRequest(_) => ClientCode::BadRequest,
            FormHostError::InvalidPath(_) => ClientCode::InvalidPath,
            FormHostError::OriginRejected(_) => ClientCode::Forbidden,
            FormHostError::AuthFailed => ClientCode::Unauthorized,
            FormHostError::NotFound(_) => ClientCode::NotFound,
            FormHostError::Configuration(_) => ClientCode::Configuration,
            FormHostError::RemoteFetch(_) => ClientCode::Upstream,
            FormHostError::FormLoad(_) => ClientCode::FormUnavailable,
            FormHostError::Internal(_) => ClientCode::Internal,
        }
    }
}
