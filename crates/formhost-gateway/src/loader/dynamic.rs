use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

use formhost_core::error::FormLoadError;

use super::runtime::{FormModule, FormRuntime};
use super::source::FormSource;

/// Version label used in cache keys when none is requested.
pub const LATEST: &str = "latest";

type LoadResult = std::result::Result<Arc<dyn FormModule>, FormLoadError>;

/// One running fetch+instantiate. `id` tells a flight apart from a later
/// one for the same key.
#[derive(Clone)]
struct Flight {
    id: u64,
    load: Shared<BoxFuture<'static, LoadResult>>,
}

/// `name@version`, version defaulting to `latest`.
pub fn cache_key(name: &str, version: Option<&str>) -> String {
    format!("{name}@{}", version.unwrap_or(LATEST))
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub version: Option<String>,
}

impl LoadOptions {
    pub fn version(v: impl Into<String>) -> Self {
        Self {
            version: Some(v.into()),
        }
    }
}

/// A loaded module handle. Never expires on its own.
#[derive(Clone)]
pub struct CacheEntry {
    pub module: Arc<dyn FormModule>,
    pub loaded_at: Instant,
}

struct LoaderInner {
    source: Arc<dyn FormSource>,
    runtime: Arc<dyn FormRuntime>,
    cache: DashMap<String, CacheEntry>,
    inflight: DashMap<String, Flight>,
    next_flight: AtomicU64,
}

/// Fetches, instantiates and caches form modules.
///
/// Concurrent loads of the same key share one fetch and one instantiation.
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct DynamicModuleLoader {
    inner: Arc<LoaderInner>,
}

impl DynamicModuleLoader {
    pub fn new(source: Arc<dyn FormSource>, runtime: Arc<dyn FormRuntime>) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                source,
                runtime,
                cache: DashMap::new(),
                inflight: DashMap::new(),
                next_flight: AtomicU64::new(0),
            }),
        }
    }

    fn cached(&self, key: &str) -> Option<Arc<dyn FormModule>> {
        self.inner
            .cache
            .get(key)
            .map(|e| Arc::clone(&e.value().module))
    }

    /// Load `name` at `opts.version` (or `latest`).
    ///
    /// A cache hit touches neither the source nor the runtime.
    pub async fn load(&self, name: &str, opts: &LoadOptions) -> LoadResult {
        // an empty version means no version
        let version = opts.version.as_deref().filter(|v| !v.is_empty());
        let key = cache_key(name, version);

        if let Some(module) = self.cached(&key) {
            tracing::debug!(%key, "form cache hit");
            return Ok(module);
        }

        let flight = match self.inner.inflight.entry(key.clone()) {
            Entry::Occupied(e) => {
                tracing::debug!(%key, "joining in-flight form load");
                e.get().clone()
            }
            Entry::Vacant(v) => {
                // a load may have finished between the miss above and this entry
                if let Some(module) = self.cached(&key) {
                    return Ok(module);
                }
                let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
                let flight = Flight {
                    id,
                    load: fetch_and_instantiate(
                        Arc::clone(&self.inner),
                        name.to_string(),
                        version.map(str::to_string),
                        key.clone(),
                        id,
                    )
                    .boxed()
                    .shared(),
                };
                v.insert(flight.clone());
                flight
            }
        };

        let result = flight.load.clone().await;
        self.inner.inflight.remove_if(&key, |_, f| f.id == flight.id);
        result
    }

    /// Like `load`, but failures are logged and swallowed.
    pub async fn preload(&self, name: &str, opts: &LoadOptions) {
        match self.load(name, opts).await {
            Ok(_) => tracing::debug!(form = %name, "form preloaded"),
            Err(e) => tracing::warn!(form = %name, error = %e, "form preload failed"),
        }
    }

    /// Drop every cached version of `name`. Returns how many entries went.
    ///
    /// Loads of `name` still in flight are detached: they finish for their
    /// current callers but never write to the cache, and the next `load`
    /// fetches again.
    pub fn invalidate(&self, name: &str) -> usize {
        let prefix = format!("{name}@");
        // inflight first, so a finishing flight cannot re-insert behind us
        self.inner.inflight.retain(|k, _| !k.starts_with(&prefix));
        let before = self.inner.cache.len();
        self.inner.cache.retain(|k, _| !k.starts_with(&prefix));
        let removed = before.saturating_sub(self.inner.cache.len());
        tracing::info!(form = %name, removed, "form cache invalidated");
        removed
    }

    pub fn clear(&self) {
        self.inner.inflight.clear();
        self.inner.cache.clear();
        tracing::info!("form cache cleared");
    }

    pub fn is_cached(&self, name: &str, version: Option<&str>) -> bool {
        self.inner.cache.contains_key(&cache_key(name, version))
    }

    /// Cached keys, sorted.
    pub fn cached_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.cache.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn entry(&self, name: &str, version: Option<&str>) -> Option<CacheEntry> {
        self.inner
            .cache
            .get(&cache_key(name, version))
            .map(|e| e.value().clone())
    }
}

async fn fetch_and_instantiate(
    inner: Arc<LoaderInner>,
    name: String,
    version: Option<String>,
    key: String,
    id: u64,
) -> LoadResult {
    let fetched = inner
        .source
        .fetch(&name, version.as_deref())
        .await
        .map_err(|e| FormLoadError::fetch(&name, e.to_string()))?;

    // side-channel metadata is informational only
    tracing::info!(
        form = %name,
        %key,
        resolved_version = ?fetched.resolved_version,
        published_at = ?fetched.published_at,
        size_bytes = ?fetched.size_bytes,
        "form code fetched"
    );

    let module = inner.runtime.instantiate(&name, &fetched.code)?;

    // only the flight still registered for `key` may fill the cache; the
    // inflight guard is held across the insert
    match inner.inflight.get(&key) {
        Some(current) if current.id == id => {
            inner.cache.insert(
                key,
                CacheEntry {
                    module: Arc::clone(&module),
                    loaded_at: Instant::now(),
                },
            );
        }
        _ => tracing::debug!(form = %name, %key, "form load superseded; not cached"),
    }
    Ok(module)
}
