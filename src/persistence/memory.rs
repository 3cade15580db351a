//! In-process key-value backend
//!
//! Used on native targets and in tests. Every call is recorded so callers
//! can check exactly what reached storage.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::{Result, StoreError};

/// A single call made against a `MemoryStorage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Get(String),
    Set(String, String),
    Remove(String),
}

impl StorageCall {
    pub fn key(&self) -> &str {
        match self {
            StorageCall::Get(key) | StorageCall::Set(key, _) | StorageCall::Remove(key) => key,
        }
    }

    /// Whether the call changes stored data
    pub fn is_write(&self) -> bool {
        !matches!(self, StorageCall::Get(_))
    }
}

/// HashMap-backed storage with a call log
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<StorageCall>>,
    /// Reject writes (simulates a full or disabled LocalStorage)
    fail_writes: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording a call
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Current value under `key`, without recording a call
    pub fn item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.borrow().clone()
    }

    /// Recorded calls that changed stored data
    pub fn writes(&self) -> Vec<StorageCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn record(&self, call: StorageCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.record(StorageCall::Get(key.to_string()));
        Ok(self.item(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.record(StorageCall::Set(key.to_string(), value.to_string()));
        if self.fail_writes.get() {
            return Err(StoreError::Backend(format!("write to '{}' rejected", key)));
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.record(StorageCall::Remove(key.to_string()));
        if self.fail_writes.get() {
            return Err(StoreError::Backend(format!("remove of '{}' rejected", key)));
        }
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
