//! formhost gateway binary.
//!
//! Loads `FORMHOST_CONFIG` (default `formhost.yaml`), builds shared state,
//! warms the registry and serves the router.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use formhost_core::error::{FormHostError, Result};
use formhost_gateway::{app_state, config, router};

async fn run() -> Result<()> {
    let path = std::env::var(config::CONFIG_PATH_ENV).unwrap_or_else(|_| "formhost.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|e| {
        FormHostError::Configuration(format!("gateway.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg)?;
    state.refresh_registry().await;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "formhost-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| FormHostError::Internal(format!("failed to bind: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| FormHostError::Internal(format!("server failed: {e}")))
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "formhost-gateway exited");
        std::process::exit(1);
    }
}
