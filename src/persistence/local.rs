//! Browser LocalStorage backend (WASM only)

use wasm_bindgen::JsValue;

use super::KeyValueStore;
use crate::error::{Result, StoreError};
use crate::platform;

/// `window.localStorage` behind the `KeyValueStore` contract
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Open the window's LocalStorage
    pub fn open() -> Result<Self> {
        let storage = platform::local_storage().ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

fn backend_error(err: JsValue) -> StoreError {
    StoreError::Backend(
        err.as_string()
            .unwrap_or_else(|| format!("{:?}", err)),
    )
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(backend_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(backend_error)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(backend_error)
    }
}
