use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use formhost_core::error::{FormHostError, Result};
use formhost_core::security::validate_proxy_path;

use super::headers::{apply_cors, redact_authorization, rewrite_authorization};
use crate::app_state::AppState;

/// Route prefix stripped before validation.
pub const PROXY_PREFIX: &str = "/proxy/";

enum OutboundBody {
    Json(serde_json::Value),
    Raw(Bytes, String),
    Text(String, Option<String>),
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn outbound_body(method: &Method, content_type: Option<&str>, body: Bytes) -> Result<Option<OutboundBody>> {
    if *method == Method::GET || *method == Method::DELETE || body.is_empty() {
        return Ok(None);
    }
    let ct = content_type.unwrap_or("").to_ascii_lowercase();
    if ct.starts_with("application/json") {
        let v: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| FormHostError::BadRequest(format!("invalid json body: {e}")))?;
        return Ok(Some(OutboundBody::Json(v)));
    }
    if ct.starts_with("multipart/form-data") {
        // boundary lives in the content type; forward both untouched
        return Ok(Some(OutboundBody::Raw(body, content_type.unwrap_or("").to_string())));
    }
    Ok(Some(OutboundBody::Text(
        String::from_utf8_lossy(&body).into_owned(),
        content_type.map(str::to_string),
    )))
}

/// Forwarder to the internal API. The destination host never comes from the
/// request.
#[derive(Debug, Clone)]
pub struct SecureProxyGateway {
    client: reqwest::Client,
    api_base: Option<String>,
}

impl SecureProxyGateway {
    pub fn new(client: reqwest::Client, api_base: Option<String>) -> Self {
        Self { client, api_base }
    }

    fn target(&self, path: &str, query: Option<&str>) -> Result<String> {
        let base = self.api_base.as_deref().ok_or_else(|| {
            FormHostError::Configuration("internal API base URL is not configured".into())
        })?;
        let mut url = format!("{}/{}", base.trim_end_matches('/'), path);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }
        Ok(url)
    }

    /// Forward an already validated `path`. Errors are for the caller to
    /// turn into a response.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response> {
        let url = self.target(path, query)?;
        let mut req = self.client.request(method.clone(), &url);

        let auth = header_str(headers, header::AUTHORIZATION).map(rewrite_authorization);
        tracing::info!(
            %method,
            %path,
            auth = %auth.as_deref().map(redact_authorization).unwrap_or_else(|| "none".into()),
            "proxying request"
        );
        if let Some(a) = auth {
            req = req.header(header::AUTHORIZATION, a);
        }
        if let Some(accept) = header_str(headers, header::ACCEPT) {
            req = req.header(header::ACCEPT, accept);
        }

        let content_type = header_str(headers, header::CONTENT_TYPE);
        req = match outbound_body(&method, content_type, body)? {
            None => req,
            Some(OutboundBody::Json(v)) => req.json(&v),
            Some(OutboundBody::Raw(bytes, ct)) => req.header(header::CONTENT_TYPE, ct).body(bytes),
            Some(OutboundBody::Text(text, ct)) => req
                .header(header::CONTENT_TYPE, ct.unwrap_or_else(|| "text/plain".into()))
                .body(text),
        };

        let upstream = req
            .send()
            .await
            .map_err(|e| FormHostError::Internal(e.to_string()))?;

        let status = upstream.status();
        let upstream_ct = upstream.headers().get(header::CONTENT_TYPE).cloned();
        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| FormHostError::Internal(e.to_string()))?;
        tracing::info!(%path, %status, bytes = bytes.len(), "upstream responded");

        let mut resp = Response::new(Body::from(bytes));
        *resp.status_mut() = status;
        if let Some(ct) = upstream_ct {
            resp.headers_mut().insert(header::CONTENT_TYPE, ct);
        }
        Ok(resp)
    }
}

fn with_cors(mut resp: Response) -> Response {
    apply_cors(resp.headers_mut());
    resp
}

/// `{GET,POST,PUT,DELETE,OPTIONS} /proxy/*path`
pub async fn proxy_handler(
    State(app): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().strip_prefix(PROXY_PREFIX).unwrap_or("");

    if validate_proxy_path(path).is_err() {
        tracing::warn!(path = ?path, "proxy path rejected");
        let body = json!({ "error": "Invalid path", "code": "INVALID_PATH" });
        return with_cors((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    if method == Method::OPTIONS {
        return with_cors(StatusCode::NO_CONTENT.into_response());
    }

    if ![Method::GET, Method::POST, Method::PUT, Method::DELETE].contains(&method) {
        let mut resp = StatusCode::METHOD_NOT_ALLOWED.into_response();
        resp.headers_mut().insert(
            header::ALLOW,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        );
        return with_cors(resp);
    }

    match app.proxy().forward(method, path, uri.query(), &headers, body).await {
        Ok(resp) => with_cors(resp),
        Err(e) => {
            tracing::error!(%path, error = %e, "proxy forwarding failed");
            let body = json!({ "error": e.to_string(), "code": e.client_code().as_str() });
            with_cors((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}
