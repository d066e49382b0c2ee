//! `window.localStorage` as a `KeyValueStore`.

use super::osd::js_message;
use crate::error::{Result, SlideviewError};
use crate::session::KeyValueStore;

pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

impl LocalStorageStore {
    /// # Errors
    /// Returns `Storage` when there is no window or storage access is denied.
    pub fn open() -> Result<Self> {
        let window =
            web_sys::window().ok_or_else(|| SlideviewError::Storage("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| SlideviewError::Storage(js_message(&e)))?
            .ok_or_else(|| SlideviewError::Storage("localStorage unavailable".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| SlideviewError::Storage(js_message(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| SlideviewError::Storage(js_message(&e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| SlideviewError::Storage(js_message(&e)))
    }
}
