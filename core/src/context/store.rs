use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::CacheError;

/// Narrow key/value blob store backing the context cache.
#[async_trait::async_trait]
pub trait ContextStore: Send + Sync {
    fn name(&self) -> &str;

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Keys starting with `prefix`, sorted.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

/// In-process store; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl ContextStore for MemoryContextStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
