//! HTTP mapping for `FormHostError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use formhost_core::error::FormHostError;

/// User-facing text for forms that fail to load.
pub const FORM_UNAVAILABLE_MESSAGE: &str = "This form cannot be displayed";

/// Wrapper so handlers can return `Result<_, ApiError>`.
#[derive(Debug)]
pub struct ApiError(pub FormHostError);

impl From<FormHostError> for ApiError {
    fn from(e: FormHostError) -> Self {
        Self(e)
    }
}

pub fn status_of(e: &FormHostError) -> StatusCode {
    match e {
        FormHostError::BadRequest(_) | FormHostError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        FormHostError::OriginRejected(_) => StatusCode::FORBIDDEN,
        FormHostError::AuthFailed => StatusCode::UNAUTHORIZED,
        FormHostError::NotFound(_) => StatusCode::NOT_FOUND,
        FormHostError::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
        FormHostError::FormLoad(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FormHostError::Configuration(_) | FormHostError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        let code = self.0.client_code().as_str();
        let body = match &self.0 {
            FormHostError::FormLoad(e) => json!({
                "error": FORM_UNAVAILABLE_MESSAGE,
                "code": code,
                "form": e.form,
                "kind": e.kind.as_str(),
                "details": e.message,
            }),
            other => json!({ "error": other.to_string(), "code": code }),
        };
        (status, Json(body)).into_response()
    }
}
