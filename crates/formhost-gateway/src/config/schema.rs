use serde::Deserialize;
use url::Url;

use formhost_core::error::{FormHostError, Result};
use formhost_core::model::FormMetadata;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub upstream: UpstreamSection,

    pub forms: FormsSection,

    #[serde(default)]
    pub security: SecuritySection,

    #[serde(default)]
    pub dashboard: DashboardSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(FormHostError::Configuration(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.upstream.validate()?;
        self.forms.validate()?;
        self.security.validate()?;
        self.dashboard.validate()?;

        Ok(())
    }
}

fn check_http_url(field: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| FormHostError::BadRequest(format!("{field} is not a valid url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FormHostError::BadRequest(format!(
            "{field} must use http or https"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Deployment base path; scopes credential storage and login routes.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            base_path: default_base_path(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !self.base_path.starts_with('/') || !self.base_path.ends_with('/') {
            return Err(FormHostError::BadRequest(
                "gateway.base_path must start and end with '/'".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_base_path() -> String {
    "/".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSection {
    /// Internal business-process API. Absence is reported per request.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl UpstreamSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(u) = &self.api_base_url {
            check_http_url("upstream.api_base_url", u)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormsSection {
    /// Root of compiled-form delivery: `<root_url>/<name>/code`.
    pub root_url: String,

    #[serde(default)]
    pub registry_url: Option<String>,

    #[serde(default = "default_registry_ttl_secs")]
    pub registry_ttl_secs: u64,

    /// Minimum wait after a failed registry refresh before trying again.
    #[serde(default = "default_registry_retry_secs")]
    pub registry_retry_secs: u64,

    #[serde(default = "default_render_fuel")]
    pub render_fuel: u64,

    #[serde(default, rename = "static")]
    pub static_forms: Option<Vec<FormMetadata>>,
}

impl FormsSection {
    pub fn validate(&self) -> Result<()> {
        check_http_url("forms.root_url", &self.root_url)?;
        if let Some(u) = &self.registry_url {
            check_http_url("forms.registry_url", u)?;
        }
        if self.registry_ttl_secs == 0 {
            return Err(FormHostError::BadRequest(
                "forms.registry_ttl_secs must be at least 1".into(),
            ));
        }
        if self.registry_retry_secs == 0 {
            return Err(FormHostError::BadRequest(
                "forms.registry_retry_secs must be at least 1".into(),
            ));
        }
        if self.render_fuel < 1000 {
            return Err(FormHostError::BadRequest(
                "forms.render_fuel must be at least 1000".into(),
            ));
        }
        Ok(())
    }
}

fn default_registry_ttl_secs() -> u64 {
    300
}
fn default_registry_retry_secs() -> u64 {
    30
}
fn default_render_fuel() -> u64 {
    10_000_000
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecuritySection {
    /// Comma-separated allowed embedding origins (exact or `*` wildcard).
    #[serde(default)]
    pub allowed_origins: String,

    /// Additionally allow loopback origins on any port.
    #[serde(default)]
    pub allow_localhost: bool,
}

impl SecuritySection {
    pub fn validate(&self) -> Result<()> {
        for o in self.origin_list() {
            if !o.contains("://") {
                return Err(FormHostError::BadRequest(format!(
                    "security.allowed_origins entry must include a scheme: {o}"
                )));
            }
        }
        Ok(())
    }

    /// Trimmed, non-empty entries of `allowed_origins`.
    pub fn origin_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardSection {
    /// Backend hosting `/dashboard/validate-token`.
    #[serde(default)]
    pub backend_url: Option<String>,
}

impl DashboardSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(u) = &self.backend_url {
            check_http_url("dashboard.backend_url", u)?;
        }
        Ok(())
    }
}
