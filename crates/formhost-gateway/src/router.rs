//! Axum router wiring.
//!
//! - `/forms`, `/forms/:name`: registry listing and standalone form render
//! - `/proxy/*path`: secure reverse proxy (method checks inside the handler)

use axum::{
    routing::{any, get},
    Router,
};

use crate::{app_state::AppState, forms, proxy};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/forms", get(forms::list_forms))
        .route("/forms/:name", get(forms::standalone_form))
        .route("/proxy/*path", any(proxy::proxy_handler))
        .with_state(state)
}
