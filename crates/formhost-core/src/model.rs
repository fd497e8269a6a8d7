//! Data model shared by the registry, loader, gates and HTTP layer.
//!
//! JSON field names follow the platform's wire contracts (camelCase).

use serde::{Deserialize, Serialize};

/// Publication status of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Active,
    Inactive,
    Deprecated,
}

/// Metadata for one published form. `form_name` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMetadata {
    pub form_name: String,
    #[serde(default)]
    pub process_name: String,
    pub current_version: String,
    pub status: FormStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl FormMetadata {
    pub fn is_active(&self) -> bool {
        self.status == FormStatus::Active
    }
}

/// Fields carried on the query string of a dashboard-originated navigation.
///
/// `s` is the encrypted token; its presence is the only signal that the
/// navigation came from the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQueryParams {
    pub s: String,
    pub instance_id: Option<String>,
    pub user_name: Option<String>,
    pub event_name: Option<String>,
    pub activity_name: Option<String>,
    pub token: Option<String>,
}

/// Body posted to the token verification endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidationRequest<'a> {
    pub encrypted_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
}

impl<'a> From<&'a DashboardQueryParams> for TokenValidationRequest<'a> {
    fn from(p: &'a DashboardQueryParams) -> Self {
        Self {
            encrypted_token: &p.s,
            instance_id: p.instance_id.as_deref(),
            user_name: p.user_name.as_deref(),
            event_name: p.event_name.as_deref(),
            activity_name: p.activity_name.as_deref(),
            token: p.token.as_deref(),
        }
    }
}

/// Session parameters resolved by the verification backend. Request-scoped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParameters {
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub requester_address: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

impl DashboardParameters {
    /// Lookup by wire name, used by the form runtime's `host.param` import.
    pub fn get(&self, key: &str) -> Option<&str> {
        let v = match key {
            "instanceId" => &self.instance_id,
            "userName" => &self.user_name,
            "eventName" => &self.event_name,
            "activityName" => &self.activity_name,
            "token" => &self.token,
            "tokenId" => &self.token_id,
            "operation" => &self.operation,
            "requesterAddress" => &self.requester_address,
            "expirationDate" => &self.expiration_date,
            _ => return None,
        };
        v.as_deref()
    }
}

/// Outcome of dashboard token verification. Returned as data, never thrown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<DashboardParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenValidation {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            parameters: None,
            error: Some(error.into()),
        }
    }
}

/// Result of the iframe embedding check. Recomputed per request, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IframeValidationResult {
    pub is_in_iframe: bool,
    pub is_allowed_origin: bool,
    pub parent_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IframeValidationResult {
    /// A standalone form may render only when both flags hold.
    pub fn passed(&self) -> bool {
        self.is_in_iframe && self.is_allowed_origin
    }
}
