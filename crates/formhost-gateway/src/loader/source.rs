use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use url::Url;

use formhost_core::error::{FormHostError, Result};

/// Informational response headers on compiled-form delivery.
pub const HEADER_FORM_VERSION: &str = "x-form-version";
pub const HEADER_PUBLISHED_AT: &str = "x-form-published-at";
pub const HEADER_FORM_SIZE: &str = "x-form-size";

/// Program text plus side-channel metadata (for logging only).
#[derive(Debug, Clone)]
pub struct FetchedForm {
    pub code: Bytes,
    pub resolved_version: Option<String>,
    pub published_at: Option<String>,
    pub size_bytes: Option<u64>,
}

#[async_trait]
pub trait FormSource: Send + Sync {
    async fn fetch(&self, name: &str, version: Option<&str>) -> Result<FetchedForm>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// `GET <root>/<name>/code[?version=<v>]`.
#[derive(Debug, Clone)]
pub struct HttpFormSource {
    client: reqwest::Client,
    root: Url,
}

impl HttpFormSource {
    pub fn new(client: reqwest::Client, root_url: &str) -> Result<Self> {
        let root = Url::parse(root_url)
            .map_err(|e| FormHostError::Configuration(format!("invalid forms root url: {e}")))?;
        if root.cannot_be_a_base() {
            return Err(FormHostError::Configuration(
                "forms root url cannot be a base".into(),
            ));
        }
        Ok(Self { client, root })
    }

    pub fn code_url(&self, name: &str, version: Option<&str>) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.pop_if_empty().push(name).push("code");
        }
        if let Some(v) = version {
            url.query_pairs_mut().append_pair("version", v);
        }
        url
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl FormSource for HttpFormSource {
    async fn fetch(&self, name: &str, version: Option<&str>) -> Result<FetchedForm> {
        let url = self.code_url(name, version);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FormHostError::RemoteFetch(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let msg = match resp.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("HTTP {status}"),
            };
            return Err(FormHostError::RemoteFetch(msg));
        }

        let headers = resp.headers().clone();
        let code = resp
            .bytes()
            .await
            .map_err(|e| FormHostError::RemoteFetch(format!("reading form body failed: {e}")))?;

        Ok(FetchedForm {
            code,
            resolved_version: header_str(&headers, HEADER_FORM_VERSION),
            published_at: header_str(&headers, HEADER_PUBLISHED_AT),
            size_bytes: header_str(&headers, HEADER_FORM_SIZE).and_then(|s| s.parse().ok()),
        })
    }
}
