//! Origin allow-list compilation and matching.
//!
//! Entries are exact origins or `*` wildcards. The loopback flag appends
//! host-only loopback patterns that ignore the port.

use formhost_core::security::origin_matches;

use crate::config::SecuritySection;

/// Loopback patterns enabled by `security.allow_localhost`.
pub const LOOPBACK_ORIGINS: [&str; 4] = [
    "http://localhost",
    "https://localhost",
    "http://127.0.0.1",
    "https://127.0.0.1",
];

#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    patterns: Vec<String>,
}

impl OriginAllowList {
    pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.trim().trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_config(sec: &SecuritySection) -> Self {
        let mut patterns = sec.origin_list();
        if sec.allow_localhost {
            patterns.extend(LOOPBACK_ORIGINS.iter().map(|s| s.to_string()));
        }
        Self::new(patterns)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.patterns.iter().any(|p| origin_matches(origin, p))
    }
}
