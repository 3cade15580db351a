//! Store configuration
//!
//! Storage key names used by the persistence layer.

use serde::{Deserialize, Serialize};

/// Default key for the announcement list
pub const ANNOUNCEMENTS_KEY: &str = "announcements";
/// Default key for the appointment list
pub const APPOINTMENTS_KEY: &str = "appointments";
/// Default key for the blocked slot list
pub const BLOCKED_SLOTS_KEY: &str = "blockedSlots";

/// Where each list lives in the key-value backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Prepended to every key, for sharing one origin between apps
    pub key_prefix: String,
    pub announcements_key: String,
    pub appointments_key: String,
    pub blocked_slots_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            announcements_key: ANNOUNCEMENTS_KEY.to_string(),
            appointments_key: APPOINTMENTS_KEY.to_string(),
            blocked_slots_key: BLOCKED_SLOTS_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Default key names under a namespace prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Full storage key for announcements
    pub fn announcements(&self) -> String {
        self.full_key(&self.announcements_key)
    }

    /// Full storage key for appointments
    pub fn appointments(&self) -> String {
        self.full_key(&self.appointments_key)
    }

    /// Full storage key for blocked slots
    pub fn blocked_slots(&self) -> String {
        self.full_key(&self.blocked_slots_key)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}
