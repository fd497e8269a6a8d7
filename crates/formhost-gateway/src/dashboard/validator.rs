use url::Url;

use formhost_core::dashboard::extract_params;
use formhost_core::error::{FormHostError, Result};
use formhost_core::model::{DashboardQueryParams, TokenValidation, TokenValidationRequest};

/// Verification endpoint, relative to the backend base URL.
pub const VALIDATE_TOKEN_PATH: &str = "dashboard/validate-token";

#[derive(Debug, Clone)]
pub struct DashboardTokenValidator {
    client: reqwest::Client,
    endpoint: Option<Url>,
}

impl DashboardTokenValidator {
    /// `backend_url = None` leaves the validator fail-closed.
    pub fn new(client: reqwest::Client, backend_url: Option<&str>) -> Result<Self> {
        let endpoint = match backend_url {
            Some(raw) => {
                let mut base = Url::parse(raw).map_err(|e| {
                    FormHostError::Configuration(format!("invalid dashboard backend url: {e}"))
                })?;
                if !base.path().ends_with('/') {
                    let path = format!("{}/", base.path());
                    base.set_path(&path);
                }
                let endpoint = base.join(VALIDATE_TOKEN_PATH).map_err(|e| {
                    FormHostError::Configuration(format!("invalid dashboard backend url: {e}"))
                })?;
                Some(endpoint)
            }
            None => None,
        };
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// Read the dashboard fields from a raw query string.
    pub fn extract_params(&self, query: Option<&str>) -> Option<DashboardQueryParams> {
        query.and_then(extract_params)
    }

    /// Verify `params` with the backend. Never fails; errors become data.
    pub async fn validate(&self, params: &DashboardQueryParams) -> TokenValidation {
        if params.s.is_empty() {
            return TokenValidation::rejected("Missing dashboard token");
        }
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::warn!("dashboard token received but no backend is configured");
            return TokenValidation::rejected("Dashboard token validation is not configured");
        };

        let body = TokenValidationRequest::from(params);
        let resp = match self.client.post(endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "dashboard token validation request failed");
                return TokenValidation::rejected(e.to_string());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, "dashboard token validation returned an error status");
            return TokenValidation::rejected(format!("HTTP {status}"));
        }

        match resp.json::<TokenValidation>().await {
            Ok(v) => {
                tracing::debug!(valid = v.valid, "dashboard token validated");
                v
            }
            Err(e) => TokenValidation::rejected(format!("invalid validation response: {e}")),
        }
    }

    /// Extraction plus validation. `None` when the query carries no token,
    /// in which case no network call is made.
    pub async fn get_parameters(&self, query: Option<&str>) -> Option<TokenValidation> {
        let params = self.extract_params(query)?;
        Some(self.validate(&params).await)
    }
}
