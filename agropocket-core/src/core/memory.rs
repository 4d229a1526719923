use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::storage::KeyValueStore;
use crate::Result;

/// In-memory key-value medium for tests and throwaway sessions.
///
/// Clones share the same map, so two handles behave like two browser tabs on
/// one origin: each sees the other's writes and the last write wins.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // Every write is a single map operation, so a poisoned map is still consistent.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_values() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.clone();

        tab_a.set("agropocket_auth", "{}").unwrap();
        assert_eq!(tab_b.get("agropocket_auth").unwrap().as_deref(), Some("{}"));

        tab_b.remove("agropocket_auth").unwrap();
        assert!(tab_a.get("agropocket_auth").unwrap().is_none());
    }
}
