//! JavaScript bindings (WASM only)
//!
//! The UI owns one instance of each store. Records cross the boundary as
//! plain JS objects with the same camelCase fields that land in
//! LocalStorage.

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::announcements::{AnnouncementStore, NewAnnouncement};
use crate::appointments::{Appointment, AppointmentPatch, AppointmentStore};
use crate::config::StoreConfig;
use crate::persistence::{LocalStorage, StorageCache};
use crate::platform;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Booking store ready");
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, JsValue> {
    let json: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&json).map_err(js_error)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(js_error)?;
    js_sys::JSON::parse(&json)
}

fn open_cache(key_prefix: Option<String>) -> Result<StorageCache<LocalStorage>, JsValue> {
    let config = key_prefix.map(StoreConfig::with_prefix).unwrap_or_default();
    let backend = LocalStorage::open().map_err(js_error)?;
    Ok(StorageCache::with_config(backend, config))
}

#[wasm_bindgen(js_name = AnnouncementStore)]
pub struct WebAnnouncementStore {
    inner: AnnouncementStore<LocalStorage>,
}

#[wasm_bindgen(js_class = AnnouncementStore)]
impl WebAnnouncementStore {
    /// Open the store and load unexpired announcements
    #[wasm_bindgen(constructor)]
    pub fn new(key_prefix: Option<String>) -> Result<WebAnnouncementStore, JsValue> {
        let mut inner = AnnouncementStore::new(open_cache(key_prefix)?);
        inner.load(platform::now_ms());
        Ok(Self { inner })
    }

    pub fn load(&mut self) {
        self.inner.load(platform::now_ms());
    }

    /// Takes `{ title, message, priority?, expiresAt }`, returns the stored record
    pub fn add(&mut self, announcement: JsValue) -> Result<JsValue, JsValue> {
        let new: NewAnnouncement = from_js(&announcement)?;
        let added = self.inner.add(new, platform::now_ms()).map_err(js_error)?;
        to_js(&added)
    }

    pub fn remove(&mut self, id: &str) -> Result<(), JsValue> {
        self.inner.remove(id).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setActive)]
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<bool, JsValue> {
        self.inner.set_active(id, active).map_err(js_error)
    }

    #[wasm_bindgen(js_name = purgeExpired)]
    pub fn purge_expired(&mut self) -> Result<usize, JsValue> {
        self.inner
            .purge_expired(platform::now_ms())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = getActive)]
    pub fn get_active(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.active(platform::now_ms()))
    }

    #[wasm_bindgen(getter)]
    pub fn announcements(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.all())
    }
}

#[wasm_bindgen(js_name = AppointmentStore)]
pub struct WebAppointmentStore {
    inner: AppointmentStore<LocalStorage>,
}

#[wasm_bindgen(js_class = AppointmentStore)]
impl WebAppointmentStore {
    /// Open the store with persisted appointments and blocked slots loaded
    #[wasm_bindgen(constructor)]
    pub fn new(key_prefix: Option<String>) -> Result<WebAppointmentStore, JsValue> {
        Ok(Self {
            inner: AppointmentStore::open(open_cache(key_prefix)?),
        })
    }

    #[wasm_bindgen(js_name = loadInitialData)]
    pub fn load_initial_data(&mut self) {
        self.inner.load();
    }

    #[wasm_bindgen(js_name = addAppointment)]
    pub fn add_appointment(&mut self, appointment: JsValue) -> Result<(), JsValue> {
        let appointment: Appointment = from_js(&appointment)?;
        self.inner.add(appointment).map_err(js_error)
    }

    /// Returns how many appointments matched `id`
    #[wasm_bindgen(js_name = updateAppointment)]
    pub fn update_appointment(&mut self, id: &str, patch: JsValue) -> Result<usize, JsValue> {
        let patch: AppointmentPatch = from_js(&patch)?;
        self.inner.update(id, &patch).map_err(js_error)
    }

    #[wasm_bindgen(js_name = deleteAppointment)]
    pub fn delete_appointment(&mut self, id: &str) -> Result<(), JsValue> {
        self.inner.delete(id).map_err(js_error)
    }

    #[wasm_bindgen(js_name = blockTimeSlot)]
    pub fn block_time_slot(&mut self, date: &str, time: &str) -> Result<(), JsValue> {
        self.inner.block_time_slot(date, time).map_err(js_error)
    }

    #[wasm_bindgen(js_name = unblockTimeSlot)]
    pub fn unblock_time_slot(&mut self, date: &str, time: &str) -> Result<(), JsValue> {
        self.inner.unblock_time_slot(date, time).map_err(js_error)
    }

    #[wasm_bindgen(js_name = isSlotBlocked)]
    pub fn is_slot_blocked(&self, date: &str, time: &str) -> bool {
        self.inner.is_slot_blocked(date, time)
    }

    #[wasm_bindgen(js_name = isSlotAvailable)]
    pub fn is_slot_available(&self, date: &str, time: &str) -> bool {
        self.inner.is_slot_available(date, time)
    }

    #[wasm_bindgen(js_name = setSelectedSlot)]
    pub fn set_selected_slot(&mut self, date: &str, time: &str) {
        self.inner.set_selected_slot(date, time);
    }

    #[wasm_bindgen(js_name = clearSelectedSlot)]
    pub fn clear_selected_slot(&mut self) {
        self.inner.clear_selected_slot();
    }

    /// `{ date, time }` or `null`
    #[wasm_bindgen(getter, js_name = selectedSlot)]
    pub fn selected_slot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.selected_slot())
    }

    #[wasm_bindgen(js_name = appointmentsOn)]
    pub fn appointments_on(&self, date: &str) -> Result<JsValue, JsValue> {
        to_js(&self.inner.appointments_on(date))
    }

    #[wasm_bindgen(getter)]
    pub fn appointments(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.appointments())
    }

    #[wasm_bindgen(getter, js_name = blockedSlots)]
    pub fn blocked_slots(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.blocked_slots())
    }
}
