use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use formhost_core::error::{FormHostError, Result};
use formhost_core::model::FormMetadata;

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Sources for `initialize`. The remote URL wins over the static list.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub remote_url: Option<String>,
    pub static_list: Option<Vec<FormMetadata>>,
    pub force_refresh: bool,
}

#[derive(Debug, Default)]
struct RegistryState {
    forms: BTreeMap<String, FormMetadata>,
    last_sync: Option<Instant>,
}

/// Process-wide key-value store of form metadata.
///
/// Synchronization replaces the whole map under one write lock, so readers
/// observe either the pre- or post-sync set, never a mix.
#[derive(Debug)]
pub struct ModuleRegistry {
    state: RwLock<RegistryState>,
    ttl: Duration,
    client: reqwest::Client,
}

impl ModuleRegistry {
    pub fn new(client: reqwest::Client, ttl: Duration) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            ttl,
            client,
        }
    }

    // Poisoning only means a writer panicked mid-way; the map is still usable.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, name: &str) -> Option<FormMetadata> {
        self.read().forms.get(name).cloned()
    }

    /// All forms, ordered by name.
    pub fn all(&self) -> Vec<FormMetadata> {
        self.read().forms.values().cloned().collect()
    }

    pub fn active(&self) -> Vec<FormMetadata> {
        self.read()
            .forms
            .values()
            .filter(|m| m.is_active())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn put(&self, name: impl Into<String>, metadata: FormMetadata) {
        self.write().forms.insert(name.into(), metadata);
    }

    pub fn remove(&self, name: &str) -> Option<FormMetadata> {
        self.write().forms.remove(name)
    }

    /// Empty the registry and forget the last sync.
    pub fn clear(&self) {
        let mut st = self.write();
        st.forms.clear();
        st.last_sync = None;
    }

    /// True before the first sync and once `ttl` has elapsed since the last one.
    pub fn is_stale(&self) -> bool {
        match self.read().last_sync {
            None => true,
            Some(at) => at.elapsed() > self.ttl,
        }
    }

    fn replace_all(&self, list: Vec<FormMetadata>) -> usize {
        let forms: BTreeMap<String, FormMetadata> = list
            .into_iter()
            .map(|m| (m.form_name.clone(), m))
            .collect();
        let count = forms.len();

        let mut st = self.write();
        st.forms = forms;
        st.last_sync = Some(Instant::now());
        count
    }

    /// Fetch the full form list and replace every entry.
    ///
    /// On any failure the registry is left untouched and the error returned.
    pub async fn sync_from_remote(&self, url: &str) -> Result<usize> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FormHostError::RemoteFetch(format!("registry request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FormHostError::RemoteFetch(format!(
                "registry returned HTTP {status}"
            )));
        }

        let list: Vec<FormMetadata> = resp
            .json()
            .await
            .map_err(|e| FormHostError::RemoteFetch(format!("registry body invalid: {e}")))?;

        let count = self.replace_all(list);
        tracing::info!(%url, forms = count, "registry synced from remote");
        Ok(count)
    }

    /// Replace every entry with `list`.
    pub fn load_from_static(&self, list: Vec<FormMetadata>) -> usize {
        let count = self.replace_all(list);
        tracing::info!(forms = count, "registry loaded from static list");
        count
    }

    /// Refresh when stale (or forced).
    ///
    /// A failing remote sync propagates even when a static list is also
    /// supplied; the static list is used only without a remote URL.
    pub async fn initialize(&self, opts: InitOptions) -> Result<()> {
        if !opts.force_refresh && !self.is_stale() {
            return Ok(());
        }

        if let Some(url) = opts.remote_url.as_deref() {
            self.sync_from_remote(url).await?;
            return Ok(());
        }

        match opts.static_list {
            Some(list) => {
                self.load_from_static(list);
            }
            None => tracing::debug!("registry initialize: no source configured"),
        }
        Ok(())
    }
}
