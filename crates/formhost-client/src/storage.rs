use dashmap::DashMap;

/// Key/value credential store (browser storage, keychain, memory...).
pub trait CredentialStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// Where the user currently is, and how to send them elsewhere.
pub trait Navigator: Send + Sync {
    /// Current location path, query string allowed.
    fn current_path(&self) -> String;
    fn redirect(&self, to: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CredentialStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.items.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.iter().map(|e| e.key().clone()).collect()
    }
}
