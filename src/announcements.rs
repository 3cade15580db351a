//! Announcement store
//!
//! Short-lived notices shown to visitors. Persisted to LocalStorage;
//! expired entries are dropped on load.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::persistence::{KeyValueStore, StorageCache};

/// How prominently an announcement is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementPriority {
    #[default]
    Info,
    Important,
    Urgent,
}

/// A published announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: AnnouncementPriority,
    /// Unix timestamp (ms) when published
    #[serde(deserialize_with = "epoch_ms::deserialize")]
    pub created_at: f64,
    /// Unix timestamp (ms) after which the announcement is hidden
    #[serde(deserialize_with = "epoch_ms::deserialize")]
    pub expires_at: f64,
    pub is_active: bool,
    /// Fields written by the UI that this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Announcement {
    /// Whether `now` is at or past the expiry time
    pub fn is_expired(&self, now: f64) -> bool {
        self.expires_at <= now
    }

    /// Active and not yet expired
    pub fn is_visible(&self, now: f64) -> bool {
        self.is_active && !self.is_expired(now)
    }
}

/// Caller-supplied part of a new announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: AnnouncementPriority,
    #[serde(deserialize_with = "epoch_ms::deserialize")]
    pub expires_at: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewAnnouncement {
    pub fn new(title: impl Into<String>, message: impl Into<String>, expires_at: f64) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            priority: AnnouncementPriority::default(),
            expires_at,
            extra: Map::new(),
        }
    }

    pub fn with_priority(mut self, priority: AnnouncementPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Timestamps stored either as epoch milliseconds or as ISO-8601 strings
///
/// `JSON.stringify(new Date())` produces the string form.
mod epoch_ms {
    use chrono::DateTime;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(f64),
        Iso(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Millis(ms) => Ok(ms),
            RawTimestamp::Iso(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.timestamp_millis() as f64)
                .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", s, e))),
        }
    }
}

/// In-memory announcement list with write-through persistence
#[derive(Debug)]
pub struct AnnouncementStore<S> {
    cache: StorageCache<S>,
    announcements: Vec<Announcement>,
}

impl<S: KeyValueStore> AnnouncementStore<S> {
    /// Empty store; call `load` to pick up persisted announcements
    pub fn new(cache: StorageCache<S>) -> Self {
        Self {
            cache,
            announcements: Vec::new(),
        }
    }

    pub fn cache(&self) -> &StorageCache<S> {
        &self.cache
    }

    /// Replace the in-memory list with the persisted, unexpired announcements
    pub fn load(&mut self, now: f64) {
        let stored = self.cache.get_announcements();
        let total = stored.len();
        self.announcements = stored.into_iter().filter(|a| !a.is_expired(now)).collect();
        log::info!(
            "Loaded {} announcements ({} expired)",
            self.announcements.len(),
            total - self.announcements.len()
        );
    }

    /// Publish a new announcement and persist the list
    ///
    /// The id is the creation timestamp in ms, bumped past any id already
    /// in use (wrapping at `u64::MAX`).
    pub fn add(&mut self, new: NewAnnouncement, now: f64) -> Result<Announcement> {
        let announcement = Announcement {
            id: self.next_id(now),
            title: new.title,
            message: new.message,
            priority: new.priority,
            created_at: now,
            expires_at: new.expires_at,
            is_active: true,
            extra: new.extra,
        };

        self.announcements.push(announcement.clone());
        self.save()?;
        Ok(announcement)
    }

    /// Drop every announcement with `id` and persist the list
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.announcements.retain(|a| a.id != id);
        self.save()
    }

    /// Show or hide an announcement without removing it
    ///
    /// Returns false if no announcement has that id.
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<bool> {
        let mut found = false;
        for announcement in self.announcements.iter_mut().filter(|a| a.id == id) {
            announcement.is_active = active;
            found = true;
        }
        if found {
            self.save()?;
        }
        Ok(found)
    }

    /// Drop expired announcements and persist, returning how many went
    pub fn purge_expired(&mut self, now: f64) -> Result<usize> {
        let before = self.announcements.len();
        self.announcements.retain(|a| !a.is_expired(now));
        let purged = before - self.announcements.len();
        if purged > 0 {
            self.save()?;
        }
        Ok(purged)
    }

    /// Announcements that are active and unexpired at `now`
    pub fn active(&self, now: f64) -> Vec<Announcement> {
        self.announcements
            .iter()
            .filter(|a| a.is_visible(now))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Announcement> {
        self.announcements.iter().find(|a| a.id == id)
    }

    pub fn all(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    fn next_id(&self, now: f64) -> String {
        let mut id = now.max(0.0) as u64;
        loop {
            let candidate = id.to_string();
            if !self.announcements.iter().any(|a| a.id == candidate) {
                return candidate;
            }
            id = id.wrapping_add(1);
        }
    }

    fn save(&self) -> Result<()> {
        self.cache.set_announcements(&self.announcements)
    }
}
