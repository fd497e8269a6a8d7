//! Shared application state for the form host.
//!
//! Every process-wide component (registry, loader cache, gates, proxy) is
//! built once here and handed to handlers by reference. Nothing lives in a
//! module-level static, so tests can stand up isolated instances.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use formhost_core::error::{FormHostError, Result};

use crate::config::GatewayConfig;
use crate::dashboard::DashboardTokenValidator;
use crate::loader::{DynamicModuleLoader, FormRuntime, FormSource, HttpFormSource, WasmFormRuntime};
use crate::policy::{IframeOriginGate, OriginAllowList};
use crate::proxy::SecureProxyGateway;
use crate::registry::{InitOptions, ModuleRegistry};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    loader: DynamicModuleLoader,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: Arc<ModuleRegistry>,
    gate: IframeOriginGate,
    dashboard: DashboardTokenValidator,
    proxy: SecureProxyGateway,
    registry_retry: Duration,
    last_refresh_failure: Mutex<Option<Instant>>,
}

impl AppState {
    /// Build application state with the HTTP form source and wasm runtime.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let client = build_client()?;
        let source = HttpFormSource::new(client.clone(), &cfg.forms.root_url)?;
        let runtime = WasmFormRuntime::new(cfg.forms.render_fuel)?;
        Self::with_components(cfg, client, Arc::new(source), Arc::new(runtime))
    }

    /// Build with caller-supplied loader collaborators.
    pub fn with_components(
        cfg: GatewayConfig,
        client: reqwest::Client,
        source: Arc<dyn FormSource>,
        runtime: Arc<dyn FormRuntime>,
    ) -> Result<Self> {
        let registry = Arc::new(ModuleRegistry::new(
            client.clone(),
            Duration::from_secs(cfg.forms.registry_ttl_secs),
        ));
        let gate = IframeOriginGate::new(OriginAllowList::from_config(&cfg.security));
        if gate.allow_list().is_empty() {
            tracing::warn!("no iframe origins allowed; standalone forms will be rejected");
        }
        let dashboard =
            DashboardTokenValidator::new(client.clone(), cfg.dashboard.backend_url.as_deref())?;
        let registry_retry = Duration::from_secs(cfg.forms.registry_retry_secs);
        let proxy = SecureProxyGateway::new(client, cfg.upstream.api_base_url.clone());
        if cfg.upstream.api_base_url.is_none() {
            tracing::warn!("upstream.api_base_url not set; proxy calls will fail");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                gate,
                dashboard,
                proxy,
                registry_retry,
                last_refresh_failure: Mutex::new(None),
            }),
            loader: DynamicModuleLoader::new(source, runtime),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn loader(&self) -> &DynamicModuleLoader {
        &self.loader
    }

    pub fn gate(&self) -> &IframeOriginGate {
        &self.inner.gate
    }

    pub fn dashboard(&self) -> &DashboardTokenValidator {
        &self.inner.dashboard
    }

    pub fn proxy(&self) -> &SecureProxyGateway {
        &self.inner.proxy
    }

    /// Registry sources from config.
    pub fn registry_init_options(&self, force_refresh: bool) -> InitOptions {
        let forms = &self.inner.cfg.forms;
        InitOptions {
            remote_url: forms.registry_url.clone(),
            static_list: forms.static_forms.clone(),
            force_refresh,
        }
    }

    fn refresh_failure(&self) -> MutexGuard<'_, Option<Instant>> {
        self.inner
            .last_refresh_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// A refresh failed less than `forms.registry_retry_secs` ago.
    pub fn registry_backing_off(&self) -> bool {
        let last = *self.refresh_failure();
        matches!(last, Some(at) if at.elapsed() < self.inner.registry_retry)
    }

    /// Refresh the registry if stale. Failures are logged; the previous
    /// metadata keeps serving and no new attempt is made until the retry
    /// window has passed.
    pub async fn refresh_registry(&self) {
        if self.registry_backing_off() {
            tracing::debug!("registry refresh skipped; backing off after failure");
            return;
        }
        let opts = self.registry_init_options(false);
        match self.inner.registry.initialize(opts).await {
            Ok(()) => *self.refresh_failure() = None,
            Err(e) => {
                *self.refresh_failure() = Some(Instant::now());
                tracing::warn!(
                    error = %e,
                    retry_secs = self.inner.registry_retry.as_secs(),
                    "registry refresh failed; serving previous metadata"
                );
            }
        }
    }
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| FormHostError::Internal(format!("http client init failed: {e}")))
}
