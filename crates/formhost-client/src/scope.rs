//! Tenant scoping of credential storage keys.
//!
//! Several deployments can share one browser origin under different base
//! paths (`/acme/`, `/globex/`). Keys are prefixed with a tenant derived
//! from the base path so a logout in one never clears another.

/// Tenant used when the base path carries no usable segment.
pub const DEFAULT_TENANT: &str = "default";

fn valid_tenant(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'-'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionScope {
    tenant: String,
}

impl SessionScope {
    /// First non-empty segment of `base_path` when it matches `[a-z0-9_-]+`,
    /// otherwise [`DEFAULT_TENANT`].
    pub fn from_base_path(base_path: &str) -> Self {
        let tenant = base_path
            .split('/')
            .find(|s| !s.is_empty())
            .filter(|s| valid_tenant(s))
            .unwrap_or(DEFAULT_TENANT);
        Self {
            tenant: tenant.to_string(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn prefix(&self) -> String {
        format!("{}:", self.tenant)
    }

    /// Primary credential.
    pub fn token_key(&self) -> String {
        format!("{}:auth_token", self.tenant)
    }

    /// Script-readable duplicate of the primary credential.
    pub fn readable_token_key(&self) -> String {
        format!("{}:auth_token_readable", self.tenant)
    }

    pub fn profile_key(&self) -> String {
        format!("{}:user_profile", self.tenant)
    }
}
