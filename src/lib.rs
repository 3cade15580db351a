//! Booking Store - state containers for a booking web UI
//!
//! Core modules:
//! - `announcements`: Expiring notices with write-through persistence
//! - `appointments`: Bookings, blocked slots and the selected slot
//! - `persistence`: Key-value backends (LocalStorage, in-memory)
//! - `platform`: Browser/native clock and storage access
//! - `config`: Storage key names
//!
//! Every mutation updates the in-memory list, then writes the whole list
//! back to storage. Times are Unix milliseconds as `f64`, the same
//! representation as `Date.now()`.

pub mod announcements;
pub mod appointments;
pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use announcements::{Announcement, AnnouncementPriority, AnnouncementStore, NewAnnouncement};
pub use appointments::{Appointment, AppointmentPatch, AppointmentStatus, AppointmentStore, Slot};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use persistence::{KeyValueStore, MemoryStorage, StorageCache};
