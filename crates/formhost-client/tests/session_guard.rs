#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reqwest::Method;
use serde_json::{json, Value};

use formhost_client::{CredentialStorage, GuardRoutes, MemoryStorage, Navigator, SessionGuard};
use formhost_core::error::FormHostError;

struct FakeNavigator {
    here: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl FakeNavigator {
    fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            here: Mutex::new(path.to_string()),
            redirects: Mutex::new(Vec::new()),
        })
    }

    fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for FakeNavigator {
    fn current_path(&self) -> String {
        self.here.lock().unwrap().clone()
    }

    fn redirect(&self, to: &str) {
        self.redirects.lock().unwrap().push(to.to_string());
        *self.here.lock().unwrap() = to.to_string();
    }
}

/// API that accepts only `Bearer live` and echoes request headers.
async fn api() -> String {
    let app = Router::new().route(
        "/api/tasks",
        get(|headers: HeaderMap| async move {
            let h = |n: &str| headers.get(n).and_then(|v| v.to_str().ok()).map(str::to_string);
            if h("authorization").as_deref() != Some("Bearer live") {
                return (StatusCode::UNAUTHORIZED, "expired").into_response();
            }
            Json(json!({
                "cacheControl": h("cache-control"),
                "pragma": h("pragma"),
                "expires": h("expires"),
            }))
            .into_response()
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn guard(
    base: &str,
    storage: Arc<MemoryStorage>,
    nav: Arc<FakeNavigator>,
) -> SessionGuard {
    SessionGuard::new(
        reqwest::Client::new(),
        base,
        GuardRoutes::for_base_path("/acme/"),
        storage,
        nav,
    )
}

#[tokio::test]
async fn attaches_credential_and_no_cache_headers() {
    let base = api().await;
    let storage = Arc::new(MemoryStorage::new());
    let g = guard(&base, Arc::clone(&storage), FakeNavigator::at("/acme/app/tasks"));
    g.store_session("live", r#"{"name":"Ada"}"#);

    let resp = g.execute(g.request(Method::GET, "/tasks")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let echo: Value = resp.json().await.unwrap();
    assert_eq!(echo["cacheControl"], "no-cache, no-store, must-revalidate");
    assert_eq!(echo["pragma"], "no-cache");
    assert_eq!(echo["expires"], "0");
}

#[tokio::test]
async fn store_session_writes_scoped_items() {
    let storage = Arc::new(MemoryStorage::new());
    let g = guard("http://unused", Arc::clone(&storage), FakeNavigator::at("/acme/"));
    g.store_session("tok", "{}");

    let mut keys = storage.keys();
    keys.sort();
    assert_eq!(
        keys,
        vec!["acme:auth_token", "acme:auth_token_readable", "acme:user_profile"]
    );
    assert_eq!(g.token().as_deref(), Some("tok"));
    assert_eq!(g.profile().as_deref(), Some("{}"));
}

#[tokio::test]
async fn expiry_in_protected_area_clears_and_redirects() {
    let base = api().await;
    let storage = Arc::new(MemoryStorage::new());
    storage.set("globex:auth_token", "other-tenant".into());
    let nav = FakeNavigator::at("/acme/app/tasks/7");
    let g = guard(&base, Arc::clone(&storage), Arc::clone(&nav));
    g.store_session("stale", "{}");

    let err = g.execute(g.request(Method::GET, "tasks")).await.unwrap_err();
    assert!(matches!(err, FormHostError::AuthFailed));
    assert_eq!(nav.redirects(), vec!["/acme/app/login?expired=true"]);
    assert!(!g.has_session());
    assert!(g.profile().is_none());
    assert_eq!(storage.keys(), vec!["globex:auth_token"]);
}

#[tokio::test]
async fn expiry_without_prior_session_omits_flag() {
    let base = api().await;
    let nav = FakeNavigator::at("/acme/app/tasks");
    let g = guard(&base, Arc::new(MemoryStorage::new()), Arc::clone(&nav));

    let err = g.execute(g.request(Method::GET, "tasks")).await.unwrap_err();
    assert!(matches!(err, FormHostError::AuthFailed));
    assert_eq!(nav.redirects(), vec!["/acme/app/login"]);
}

#[tokio::test]
async fn login_view_and_public_pages_get_the_raw_401() {
    let base = api().await;

    for here in ["/acme/app/login", "/acme/public/forms"] {
        let storage = Arc::new(MemoryStorage::new());
        let nav = FakeNavigator::at(here);
        let g = guard(&base, Arc::clone(&storage), Arc::clone(&nav));
        g.store_session("stale", "{}");

        let resp = g.execute(g.request(Method::GET, "tasks")).await.unwrap();
        assert_eq!(resp.status(), 401, "{here}");
        assert!(nav.redirects().is_empty(), "{here}");
        assert!(g.has_session(), "{here}");
    }
}

#[tokio::test]
async fn unreachable_api_is_a_fetch_error() {
    let g = guard(
        "http://127.0.0.1:9/api",
        Arc::new(MemoryStorage::new()),
        FakeNavigator::at("/acme/app/"),
    );
    let err = g.execute(g.request(Method::GET, "tasks")).await.unwrap_err();
    assert!(matches!(err, FormHostError::RemoteFetch(_)));
}
