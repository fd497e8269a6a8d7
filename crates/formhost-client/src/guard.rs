use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::{Method, RequestBuilder, Response, StatusCode};

use formhost_core::error::{FormHostError, Result};

use crate::scope::SessionScope;
use crate::storage::{CredentialStorage, Navigator};

/// Query flag appended to the login redirect when a session existed.
pub const EXPIRED_FLAG: &str = "expired=true";

/// Views of the deployment, relative to `base_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRoutes {
    /// Deployment base path; starts and ends with `/`.
    pub base_path: String,
    /// Prefix of the authenticated area.
    pub protected_route: String,
    pub login_route: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            base_path: "/".into(),
            protected_route: "app/".into(),
            login_route: "app/login".into(),
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

impl GuardRoutes {
    pub fn for_base_path(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    pub fn login_path(&self) -> String {
        format!("{}{}", self.base_path, self.login_route)
    }

    fn protected_prefix(&self) -> String {
        format!("{}{}", self.base_path, self.protected_route)
    }

    pub fn is_protected(&self, path: &str) -> bool {
        let path = strip_query(path);
        let prefix = self.protected_prefix();
        path.starts_with(&prefix) || path == prefix.trim_end_matches('/')
    }

    pub fn is_login(&self, path: &str) -> bool {
        strip_query(path).trim_end_matches('/') == self.login_path().trim_end_matches('/')
    }
}

/// Wraps outbound calls of one tenant's session.
pub struct SessionGuard {
    client: reqwest::Client,
    api_base: String,
    routes: GuardRoutes,
    scope: SessionScope,
    storage: Arc<dyn CredentialStorage>,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        routes: GuardRoutes,
        storage: Arc<dyn CredentialStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let scope = SessionScope::from_base_path(&routes.base_path);
        Self {
            client,
            api_base: api_base.into(),
            routes,
            scope,
            storage,
            navigator,
        }
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    pub fn routes(&self) -> &GuardRoutes {
        &self.routes
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(&self.scope.token_key())
    }

    pub fn profile(&self) -> Option<String> {
        self.storage.get(&self.scope.profile_key())
    }

    pub fn has_session(&self) -> bool {
        self.token().is_some()
    }

    /// Persist a fresh login. The credential is written twice: the primary
    /// item and a script-readable copy.
    pub fn store_session(&self, token: &str, profile: &str) {
        self.storage.set(&self.scope.token_key(), token.to_string());
        self.storage
            .set(&self.scope.readable_token_key(), token.to_string());
        self.storage.set(&self.scope.profile_key(), profile.to_string());
        tracing::debug!(tenant = %self.scope.tenant(), "session stored");
    }

    /// Remove every item of this tenant. Returns how many went.
    pub fn clear_session(&self) -> usize {
        let prefix = self.scope.prefix();
        let keys: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect();
        for k in &keys {
            self.storage.remove(k);
        }
        tracing::info!(tenant = %self.scope.tenant(), removed = keys.len(), "session cleared");
        keys.len()
    }

    /// Request to `<api_base>/<path>` with the credential and no-cache headers.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut req = self
            .client
            .request(method, url)
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0");
        if let Some(token) = self.token() {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        req
    }

    /// Send `builder`, intercepting session expiry.
    ///
    /// A 401 seen while the user is inside the protected area (and not on
    /// the login view) clears the session, redirects to login and yields
    /// `AuthFailed`. Every other response is returned untouched.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = builder
            .send()
            .await
            .map_err(|e| FormHostError::RemoteFetch(e.to_string()))?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        let here = self.navigator.current_path();
        if !self.routes.is_protected(&here) || self.routes.is_login(&here) {
            return Ok(resp);
        }

        let had_session = self.has_session();
        self.clear_session();

        let mut target = self.routes.login_path();
        if had_session {
            target.push('?');
            target.push_str(EXPIRED_FLAG);
        }
        tracing::warn!(from = %here, to = %target, "session expired; redirecting to login");
        self.navigator.redirect(&target);
        Err(FormHostError::AuthFailed)
    }
}
