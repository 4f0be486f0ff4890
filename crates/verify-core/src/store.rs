//! Manual-check persistence
//!
//! Checks are stored as a JSON object of encoded keys under one storage
//! entry. Storage is best-effort: a failed read starts empty, a failed write
//! switches the store to memory-only for the rest of the session.

use crate::error::VerifyError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Identity of a number: (page file, line, display value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckKey {
    pub file: String,
    pub line: u32,
    pub value: String,
}

impl CheckKey {
    pub fn new(file: impl Into<String>, line: u32, value: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            value: value.into(),
        }
    }

    /// Persisted form, `file:line:value`
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.value)
    }
}

/// Synchronous key/value storage (browser `localStorage` or in-memory)
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, VerifyError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), VerifyError>;
}

/// Storage that lives for the process lifetime
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, VerifyError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), VerifyError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The user's manual checks plus the overlay-enabled preference
#[derive(Debug)]
pub struct ManualCheckStore<S: StorageBackend> {
    backend: S,
    checks_key: String,
    enabled_key: String,
    checked: BTreeMap<String, bool>,
    persistent: bool,
}

impl<S: StorageBackend> ManualCheckStore<S> {
    /// Load checks from storage; unreadable or malformed state starts empty
    pub fn load(backend: S, checks_key: &str, enabled_key: &str) -> Self {
        let checked = match backend.get_item(checks_key) {
            Ok(Some(json)) => match serde_json::from_str::<BTreeMap<String, bool>>(&json) {
                Ok(map) => map.into_iter().filter(|(_, v)| *v).collect(),
                Err(e) => {
                    tracing::warn!("Ignoring malformed manual checks: {}", e);
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Manual checks unreadable, starting empty: {}", e);
                BTreeMap::new()
            }
        };

        Self {
            backend,
            checks_key: checks_key.to_string(),
            enabled_key: enabled_key.to_string(),
            checked,
            persistent: true,
        }
    }

    pub fn is_checked(&self, key: &CheckKey) -> bool {
        self.checked.contains_key(&key.encode())
    }

    /// Flip a key's membership and persist; returns the new state
    pub fn toggle(&mut self, key: &CheckKey) -> bool {
        let checked = !self.is_checked(key);
        self.set_checked(key, checked);
        checked
    }

    /// Set a key's membership explicitly and persist
    pub fn set_checked(&mut self, key: &CheckKey, checked: bool) {
        let encoded = key.encode();
        if checked {
            self.checked.insert(encoded, true);
        } else {
            self.checked.remove(&encoded);
        }
        self.persist();
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// False once a write has failed this session
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Stored enabled flag, defaulting to enabled
    pub fn enabled(&self) -> bool {
        match self.backend.get_item(&self.enabled_key) {
            Ok(Some(v)) => v != "false",
            Ok(None) => true,
            Err(e) => {
                tracing::debug!("Enabled flag unreadable: {}", e);
                true
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        let key = self.enabled_key.clone();
        self.write(&key, value);
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.checked) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Could not serialize manual checks: {}", e);
                return;
            }
        };
        let key = self.checks_key.clone();
        self.write(&key, &json);
    }

    fn write(&mut self, key: &str, value: &str) {
        if !self.persistent {
            return;
        }
        if let Err(e) = self.backend.set_item(key, value) {
            tracing::warn!("Storage write failed, keeping state in memory: {}", e);
            self.persistent = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CHECKS: &str = "checks";
    const ENABLED: &str = "enabled";

    /// Storage that fails every call
    struct BrokenStorage;

    impl StorageBackend for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, VerifyError> {
            Err(VerifyError::Storage("SecurityError".to_string()))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), VerifyError> {
            Err(VerifyError::Storage("QuotaExceededError".to_string()))
        }
    }

    fn key() -> CheckKey {
        CheckKey::new("financial-reports/ffr1.html", 10, "1,234.56")
    }

    #[test]
    fn test_key_encoding() {
        assert_eq!(key().encode(), "financial-reports/ffr1.html:10:1,234.56");
    }

    #[test]
    fn test_toggle_persists_immediately() {
        let mut store = ManualCheckStore::load(MemoryStorage::new(), CHECKS, ENABLED);
        assert!(store.toggle(&key()));
        assert!(store.is_checked(&key()));
        assert_eq!(
            store.backend().get(CHECKS),
            Some(r#"{"financial-reports/ffr1.html:10:1,234.56":true}"#)
        );
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut store = ManualCheckStore::load(MemoryStorage::new(), CHECKS, ENABLED);
        store.toggle(&key());
        assert!(!store.toggle(&key()));
        assert!(!store.is_checked(&key()));
        assert_eq!(store.backend().get(CHECKS), Some("{}"));
    }

    #[test]
    fn test_reload_from_storage() {
        let storage = MemoryStorage::new().with_item(
            CHECKS,
            r#"{"financial-reports/ffr1.html:10:1,234.56":true,"x:1:2":false}"#,
        );
        let store = ManualCheckStore::load(storage, CHECKS, ENABLED);
        assert!(store.is_checked(&key()));
        assert!(!store.is_checked(&CheckKey::new("x", 1, "2")));
        assert_eq!(store.checked_count(), 1);
    }

    #[test]
    fn test_malformed_json_is_empty() {
        let storage = MemoryStorage::new().with_item(CHECKS, "[1, 2");
        let store = ManualCheckStore::load(storage, CHECKS, ENABLED);
        assert_eq!(store.checked_count(), 0);
    }

    #[test]
    fn test_broken_storage_degrades_to_memory() {
        let mut store = ManualCheckStore::load(BrokenStorage, CHECKS, ENABLED);
        assert!(store.is_persistent());
        assert!(store.toggle(&key()));
        assert!(store.is_checked(&key()));
        assert!(!store.is_persistent());
        assert!(!store.toggle(&key()));
        assert!(store.enabled());
    }

    #[test]
    fn test_enabled_flag() {
        let mut store = ManualCheckStore::load(MemoryStorage::new(), CHECKS, ENABLED);
        assert!(store.enabled());
        store.set_enabled(false);
        assert!(!store.enabled());
        assert_eq!(store.backend().get(ENABLED), Some("false"));
        store.set_enabled(true);
        assert!(store.enabled());
    }
}
