#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use formhost_gateway::app_state::AppState;
use formhost_gateway::config::load_from_str;
use formhost_gateway::router::build_router;

use support::{
    config_yaml, spawn, CountingRuntime, CountingSource, EXPENSE_FORM, GREETING_FORM,
    NO_DEFAULT_FORM,
};

const SECURITY: &str = "security:\n  allowed_origins: \"https://portal.acme.com, https://*.partners.acme.com\"\n";

const STATIC_FORMS: &str = r#"  static:
    - formName: expense-approval
      processName: Expenses
      currentVersion: "1.0.0"
      status: active
    - formName: legacy-leave
      processName: Leave
      currentVersion: "0.9.0"
      status: deprecated
"#;

async fn host(source: Arc<CountingSource>, extra: &str) -> String {
    let cfg = load_from_str(&config_yaml("http://127.0.0.1:9/forms", extra)).unwrap();
    let state =
        AppState::with_components(cfg, reqwest::Client::new(), source, CountingRuntime::new())
            .unwrap();
    spawn(build_router(state)).await
}

fn embedded_from(referer: &str, url: String) -> reqwest::RequestBuilder {
    reqwest::Client::new()
        .get(url)
        .header("sec-fetch-dest", "iframe")
        .header("referer", referer)
}

/// Backend accepting only `good-token`, echoing `UserName` back as a parameter.
async fn dashboard_backend() -> String {
    let app = Router::new().route(
        "/dashboard/validate-token",
        post(|Json(body): Json<Value>| async move {
            if body["encryptedToken"] == "good-token" {
                Json(json!({ "valid": true, "parameters": { "userName": body["userName"] } }))
            } else {
                Json(json!({ "valid": false, "error": "Invalid token" }))
            }
        }),
    );
    spawn(app).await
}

#[tokio::test]
async fn top_level_navigation_is_forbidden_before_any_fetch() {
    let source = CountingSource::serving(EXPENSE_FORM);
    let base = host(Arc::clone(&source), SECURITY).await;

    let resp = reqwest::get(format!("{base}/forms/expense-approval")).await.unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["validation"]["isInIframe"], false);
    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn foreign_parent_origin_is_forbidden() {
    let source = CountingSource::serving(EXPENSE_FORM);
    let base = host(Arc::clone(&source), SECURITY).await;

    let resp = embedded_from("https://evil.example/", format!("{base}/forms/expense-approval"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["validation"]["isInIframe"], true);
    assert_eq!(body["validation"]["parentOrigin"], "https://evil.example");
    assert!(body["error"].as_str().unwrap().contains("https://evil.example"));
    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn allowed_parent_renders_form_nodes() {
    let source = CountingSource::serving(EXPENSE_FORM);
    let base = host(Arc::clone(&source), SECURITY).await;

    let resp = embedded_from(
        "https://hr.partners.acme.com/inbox",
        format!("{base}/forms/expense-approval"),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["form"], "expense-approval");
    assert_eq!(body["version"], "latest");
    assert_eq!(body["parentOrigin"], "https://hr.partners.acme.com");
    assert!(body["parameters"].is_null());
    assert_eq!(
        body["nodes"],
        json!([
            { "kind": "heading", "text": "Expense approval" },
            { "kind": "text", "text": "Submit your claim" }
        ])
    );

    // second render comes from the module cache
    let again = embedded_from("https://portal.acme.com/", format!("{base}/forms/expense-approval"))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 200);
    assert_eq!(source.fetches(), 1);
}

#[tokio::test]
async fn requested_version_is_loaded_separately() {
    let source = CountingSource::serving(EXPENSE_FORM);
    let base = host(Arc::clone(&source), SECURITY).await;

    let body: Value = embedded_from(
        "https://portal.acme.com/",
        format!("{base}/forms/expense-approval?version=2.0.0"),
    )
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(body["version"], "2.0.0");
    assert_eq!(
        source.requests(),
        vec![("expense-approval".to_string(), Some("2.0.0".to_string()))]
    );
}

#[tokio::test]
async fn empty_version_renders_latest() {
    let source = CountingSource::serving(EXPENSE_FORM);
    let base = host(Arc::clone(&source), SECURITY).await;

    let body: Value = embedded_from(
        "https://portal.acme.com/",
        format!("{base}/forms/expense-approval?version="),
    )
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(body["version"], "latest");
    assert_eq!(source.requests(), vec![("expense-approval".to_string(), None)]);
}

#[tokio::test]
async fn registry_outage_is_not_retried_on_every_render() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let registry = spawn(Router::new().route(
        "/registry",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::SERVICE_UNAVAILABLE
            }
        }),
    ))
    .await;
    let extra = format!("  registry_url: \"{registry}/registry\"\n{SECURITY}");
    let base = host(CountingSource::serving(EXPENSE_FORM), &extra).await;

    for _ in 0..3 {
        let resp = embedded_from("https://portal.acme.com/", format!("{base}/forms/expense-approval"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn inactive_registry_entry_is_not_found() {
    let source = CountingSource::serving(EXPENSE_FORM);
    let base = host(Arc::clone(&source), &format!("{STATIC_FORMS}{SECURITY}")).await;

    let resp = embedded_from("https://portal.acme.com/", format!("{base}/forms/legacy-leave"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn listing_shows_active_forms_only() {
    let base = host(
        CountingSource::serving(EXPENSE_FORM),
        &format!("{STATIC_FORMS}{SECURITY}"),
    )
    .await;

    let list: Vec<Value> = reqwest::get(format!("{base}/forms"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["formName"], "expense-approval");
    assert_eq!(list[0]["status"], "active");
}

#[tokio::test]
async fn malformed_module_shows_fallback_message() {
    let base = host(CountingSource::serving(NO_DEFAULT_FORM), SECURITY).await;

    let resp = embedded_from("https://portal.acme.com/", format!("{base}/forms/broken"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "This form cannot be displayed");
    assert_eq!(body["code"], "FORM_UNAVAILABLE");
    assert_eq!(body["form"], "broken");
    assert_eq!(body["kind"], "malformed_module");
}

#[tokio::test]
async fn fetch_failure_shows_fallback_message() {
    let base = host(CountingSource::failing("HTTP 404"), SECURITY).await;

    let resp = embedded_from("https://portal.acme.com/", format!("{base}/forms/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "fetch");
    assert!(body["details"].as_str().unwrap().contains("HTTP 404"));
}

#[tokio::test]
async fn dashboard_parameters_reach_the_form() {
    let backend = dashboard_backend().await;
    let extra = format!("{SECURITY}dashboard:\n  backend_url: \"{backend}\"\n");
    let base = host(CountingSource::serving(GREETING_FORM), &extra).await;

    let body: Value = embedded_from(
        "https://portal.acme.com/",
        format!("{base}/forms/greeting?s=good-token&UserName=Ada&InstanceId=42"),
    )
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(body["parameters"]["userName"], "Ada");
    assert_eq!(body["nodes"], json!([{ "kind": "text", "text": "Ada" }]));
}

#[tokio::test]
async fn rejected_token_still_renders_without_parameters() {
    let backend = dashboard_backend().await;
    let extra = format!("{SECURITY}dashboard:\n  backend_url: \"{backend}\"\n");
    let base = host(CountingSource::serving(GREETING_FORM), &extra).await;

    let resp = embedded_from(
        "https://portal.acme.com/",
        format!("{base}/forms/greeting?s=forged&UserName=Mallory"),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["parameters"].is_null());
    assert_eq!(body["nodes"], json!([]));
}
