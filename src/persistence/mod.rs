//! Persistence layer
//!
//! Stores mirror their lists to a string key-value backend after every
//! mutation. The backend contract follows the Web Storage API so the
//! browser's LocalStorage plugs in directly:
//! - `KeyValueStore`: raw get/set/remove of JSON strings
//! - `StorageCache`: typed lists serialized under configured keys
//! - `MemoryStorage`: in-process backend that records every call

mod memory;
#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::{MemoryStorage, StorageCall};
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::announcements::Announcement;
use crate::appointments::{Appointment, Slot};
use crate::config::StoreConfig;
use crate::error::Result;

/// String key-value backend (LocalStorage semantics)
pub trait KeyValueStore {
    /// Value stored under `key`, `None` if absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// Typed view of the backend: one JSON array per list
#[derive(Debug, Clone)]
pub struct StorageCache<S> {
    backend: S,
    config: StoreConfig,
}

impl<S: KeyValueStore> StorageCache<S> {
    /// Cache over `backend` using the default key names
    pub fn new(backend: S) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    pub fn with_config(backend: S, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn get_announcements(&self) -> Vec<Announcement> {
        self.read_list(&self.config.announcements())
    }

    pub fn set_announcements(&self, announcements: &[Announcement]) -> Result<()> {
        self.write_list(&self.config.announcements(), announcements)
    }

    pub fn get_appointments(&self) -> Vec<Appointment> {
        self.read_list(&self.config.appointments())
    }

    pub fn set_appointments(&self, appointments: &[Appointment]) -> Result<()> {
        self.write_list(&self.config.appointments(), appointments)
    }

    pub fn get_blocked_slots(&self) -> Vec<Slot> {
        self.read_list(&self.config.blocked_slots())
    }

    pub fn set_blocked_slots(&self, slots: &[Slot]) -> Result<()> {
        self.write_list(&self.config.blocked_slots(), slots)
    }

    /// Read a JSON array, skipping entries that do not decode
    ///
    /// An unreadable key or a value that is not an array loads as empty.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let json = match self.backend.get_item(key) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Could not read '{}' from storage: {}", key, e);
                return Vec::new();
            }
        };

        let values: Vec<Value> = match serde_json::from_str(&json) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Discarding malformed '{}' in storage: {}", key, e);
                return Vec::new();
            }
        };

        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("Skipping entry {} of '{}' in storage: {}", index, key, e);
                    None
                }
            })
            .collect()
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.backend.set_item(key, &json)?;
        log::debug!("Saved '{}' ({} entries)", key, items.len());
        Ok(())
    }
}
