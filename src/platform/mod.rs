//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall clock time (ms since Unix epoch)
//! - Storage (LocalStorage on web)

/// Current time in milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Current time in milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

/// The window's LocalStorage, if the browser exposes one
#[cfg(target_arch = "wasm32")]
pub fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}
