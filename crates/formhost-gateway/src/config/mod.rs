//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use formhost_core::error::{FormHostError, Result};

pub use schema::{
    DashboardSection, FormsSection, GatewayConfig, GatewaySection, SecuritySection,
    UpstreamSection,
};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FORMHOST_CONFIG";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| FormHostError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| FormHostError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
