use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use formhost_core::error::FormHostError;
use formhost_core::model::{DashboardParameters, FormMetadata};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::loader::{LoadOptions, RenderContext, LATEST};
use crate::policy::FrameContext;

#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub version: Option<String>,
}

/// `GET /forms`: active forms from the registry.
pub async fn list_forms(State(app): State<AppState>) -> Json<Vec<FormMetadata>> {
    app.refresh_registry().await;
    Json(app.registry().active())
}

async fn resolve_parameters(app: &AppState, raw_query: Option<&str>) -> Option<DashboardParameters> {
    match app.dashboard().get_parameters(raw_query).await {
        Some(v) if v.valid => v.parameters,
        Some(v) => {
            tracing::warn!(error = ?v.error, "dashboard token rejected; rendering without parameters");
            None
        }
        None => None,
    }
}

/// `GET /forms/:name`: render a form embedded in an allowed parent frame.
pub async fn standalone_form(
    State(app): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<FormQuery>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    // nothing renders before the embedding check passes
    let frame = FrameContext::from_headers(&headers);
    let check = app.gate().validate(&frame, None);
    if !check.passed() {
        let body = json!({
            "error": check.error.clone().unwrap_or_else(|| "Embedding not allowed".into()),
            "code": "FORBIDDEN",
            "validation": check,
        });
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }

    let parameters = resolve_parameters(&app, raw_query.as_deref()).await;

    app.refresh_registry().await;
    if let Some(meta) = app.registry().get(&name) {
        if !meta.is_active() {
            return Err(FormHostError::NotFound(format!("form '{name}' is not active")).into());
        }
    }

    // `?version=` is the same as no version
    let version = q.version.filter(|v| !v.is_empty());
    let opts = LoadOptions {
        version: version.clone(),
    };
    let module = app.loader().load(&name, &opts).await.map_err(FormHostError::from)?;

    let ctx = RenderContext {
        parameters: parameters.clone(),
    };
    let output = tokio::task::spawn_blocking(move || module.render(&ctx))
        .await
        .map_err(|e| FormHostError::Internal(format!("render task failed: {e}")))??;

    tracing::info!(form = %name, nodes = output.nodes.len(), "form rendered");

    Ok(Json(json!({
        "form": name,
        "version": version.as_deref().unwrap_or(LATEST),
        "parentOrigin": check.parent_origin,
        "parameters": parameters,
        "nodes": output.nodes,
    }))
    .into_response())
}
