//! Iframe origin gate.
//!
//! A standalone form renders only inside an iframe whose parent origin is on
//! the allow-list. In a server, "embedded" comes from the browser-set
//! `Sec-Fetch-Dest` header and the parent origin from `Referer`; the parent's
//! address is never read any other way.

use axum::http::{header, HeaderMap};

use formhost_core::model::IframeValidationResult;
use formhost_core::security::parent_origin_from_referrer;

use super::allowlist::OriginAllowList;

/// What the request tells us about the browsing context that issued it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameContext {
    /// The document is the top-level window.
    pub top_level: bool,
    /// Referring page, if sent.
    pub referrer: Option<String>,
}

impl FrameContext {
    pub fn embedded(referrer: impl Into<String>) -> Self {
        Self {
            top_level: false,
            referrer: Some(referrer.into()),
        }
    }

    pub fn top_level() -> Self {
        Self {
            top_level: true,
            referrer: None,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let dest = headers
            .get("sec-fetch-dest")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_ascii_lowercase());
        let embedded = matches!(dest.as_deref(), Some("iframe") | Some("frame"));
        let referrer = headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self {
            top_level: !embedded,
            referrer,
        }
    }

    /// The document's window differs from its top-level window.
    pub fn is_embedded(&self) -> bool {
        !self.top_level
    }

    pub fn resolve_parent_origin(&self) -> Option<String> {
        self.referrer.as_deref().and_then(parent_origin_from_referrer)
    }
}

#[derive(Debug, Clone)]
pub struct IframeOriginGate {
    allow: OriginAllowList,
}

impl IframeOriginGate {
    pub fn new(allow: OriginAllowList) -> Self {
        Self { allow }
    }

    pub fn allow_list(&self) -> &OriginAllowList {
        &self.allow
    }

    /// Check `frame` against `allow_list`, or the configured list when `None`.
    pub fn validate(
        &self,
        frame: &FrameContext,
        allow_list: Option<&OriginAllowList>,
    ) -> IframeValidationResult {
        let allow = allow_list.unwrap_or(&self.allow);

        if !frame.is_embedded() {
            return IframeValidationResult {
                is_in_iframe: false,
                is_allowed_origin: false,
                parent_origin: None,
                error: Some("Page is not embedded in an iframe".into()),
            };
        }

        let Some(origin) = frame.resolve_parent_origin() else {
            return IframeValidationResult {
                is_in_iframe: true,
                is_allowed_origin: false,
                parent_origin: None,
                error: Some("Unable to determine parent origin".into()),
            };
        };

        if !allow.is_allowed(&origin) {
            tracing::warn!(%origin, "iframe embedding origin rejected");
            return IframeValidationResult {
                is_in_iframe: true,
                is_allowed_origin: false,
                error: Some(format!("Origin {origin} is not allowed to embed this form")),
                parent_origin: Some(origin),
            };
        }

        IframeValidationResult {
            is_in_iframe: true,
            is_allowed_origin: true,
            parent_origin: Some(origin),
            error: None,
        }
    }
}
