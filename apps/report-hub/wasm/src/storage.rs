//! `localStorage` backend for the manual-check store
//!
//! Access can throw (private browsing, disabled storage, quota); every call
//! returns a `VerifyError::Storage` instead and the store falls back to memory.

use verify_core::{StorageBackend, VerifyError};

pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("localStorage unavailable, manual checks will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, VerifyError> {
        self.storage
            .as_ref()
            .ok_or_else(|| VerifyError::Storage("localStorage unavailable".to_string()))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, VerifyError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| VerifyError::Storage(format!("{:?}", e)))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), VerifyError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| VerifyError::Storage(format!("{:?}", e)))
    }
}
