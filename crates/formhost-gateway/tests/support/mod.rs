//! Shared helpers: in-process HTTP collaborators and form fixtures.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;

use formhost_core::error::{FormHostError, FormLoadError, Result};
use formhost_core::model::{FormMetadata, FormStatus};
use formhost_gateway::loader::{FetchedForm, FormModule, FormRuntime, FormSource, WasmFormRuntime};

/// Serve `app` on an ephemeral loopback port; returns `http://127.0.0.1:<port>`.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Heading + text, no imports beyond `ui`.
pub const EXPENSE_FORM: &str = r#"
(module
  (import "ui" "heading" (func $heading (param i32 i32)))
  (import "ui" "text" (func $text (param i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "Expense approval")
  (data (i32.const 32) "Submit your claim")
  (func (export "default")
    (call $heading (i32.const 0) (i32.const 16))
    (call $text (i32.const 32) (i32.const 17))))
"#;

/// Renders the `userName` dashboard parameter when present.
pub const GREETING_FORM: &str = r#"
(module
  (import "host" "param" (func $param (param i32 i32 i32 i32) (result i32)))
  (import "ui" "text" (func $text (param i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "userName")
  (func (export "default") (local $n i32)
    (local.set $n (call $param (i32.const 0) (i32.const 8) (i32.const 64) (i32.const 64)))
    (if (i32.ge_s (local.get $n) (i32.const 0))
      (then (call $text (i32.const 64) (local.get $n))))))
"#;

/// Compiles, but exports `render` instead of `default`.
pub const NO_DEFAULT_FORM: &str = r#"
(module
  (func (export "render")))
"#;

/// Needs an import the host does not offer.
pub const UNKNOWN_IMPORT_FORM: &str = r#"
(module
  (import "fs" "open" (func $open (param i32)))
  (func (export "default")))
"#;

/// Never returns; must be stopped by the fuel budget.
pub const SPIN_FORM: &str = r#"
(module
  (func (export "default")
    (loop $l (br $l))))
"#;

pub fn metadata(name: &str, status: FormStatus) -> FormMetadata {
    FormMetadata {
        form_name: name.to_string(),
        process_name: "Expenses".into(),
        current_version: "1.0.0".into(),
        status,
        description: String::new(),
        author: "ops".into(),
        size_bytes: 512,
        published_at: "2026-01-05T10:00:00Z".into(),
        updated_at: "2026-01-05T10:00:00Z".into(),
    }
}

/// In-memory form source that counts and records fetches.
pub struct CountingSource {
    code: Mutex<Result<String>>,
    delay: Duration,
    fetches: AtomicUsize,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl CountingSource {
    pub fn serving(code: &str) -> Arc<Self> {
        Self::build(Ok(code.to_string()), Duration::ZERO)
    }

    pub fn slow(code: &str, delay: Duration) -> Arc<Self> {
        Self::build(Ok(code.to_string()), delay)
    }

    pub fn failing(msg: &str) -> Arc<Self> {
        Self::slow_failing(msg, Duration::ZERO)
    }

    pub fn slow_failing(msg: &str, delay: Duration) -> Arc<Self> {
        Self::build(Err(FormHostError::RemoteFetch(msg.to_string())), delay)
    }

    fn build(code: Result<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            code: Mutex::new(code),
            delay,
            fetches: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn set_code(&self, code: &str) {
        *self.code.lock().unwrap() = Ok(code.to_string());
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormSource for CountingSource {
    async fn fetch(&self, name: &str, version: Option<&str>) -> Result<FetchedForm> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((name.to_string(), version.map(str::to_string)));
        // the response reflects what was published when the request arrived
        let code = match &*self.code.lock().unwrap() {
            Ok(c) => Ok(c.clone()),
            Err(e) => Err(FormHostError::RemoteFetch(e.to_string())),
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let code = code?;
        Ok(FetchedForm {
            size_bytes: Some(code.len() as u64),
            code: Bytes::from(code),
            resolved_version: version.map(str::to_string),
            published_at: None,
        })
    }
}

/// Wasm runtime that counts instantiations.
pub struct CountingRuntime {
    inner: WasmFormRuntime,
    count: AtomicUsize,
}

impl CountingRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: WasmFormRuntime::new(1_000_000).unwrap(),
            count: AtomicUsize::new(0),
        })
    }

    pub fn instantiations(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl FormRuntime for CountingRuntime {
    fn instantiate(
        &self,
        form: &str,
        code: &[u8],
    ) -> std::result::Result<Arc<dyn FormModule>, FormLoadError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.instantiate(form, code)
    }
}

/// Minimal valid gateway config pointing at `forms_root`.
pub fn config_yaml(forms_root: &str, extra: &str) -> String {
    format!(
        "version: 1\nforms:\n  root_url: \"{forms_root}\"\n{extra}"
    )
}
