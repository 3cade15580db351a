//! Appointment store
//!
//! Booked appointments plus manually blocked time slots, both persisted to
//! LocalStorage. The currently selected slot lives in memory only.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::persistence::{KeyValueStore, StorageCache};

/// A (date, time) pair, e.g. ("2024-05-01", "10:30")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
}

impl Slot {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    pub fn matches(&self, date: &str, time: &str) -> bool {
        self.date == date && self.time == time
    }
}

/// Booking state of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// A booked appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    /// Fields written by the UI that this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    pub fn new(
        id: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            time: time.into(),
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            customer_email: None,
            service: None,
            notes: None,
            status: AppointmentStatus::default(),
            extra: Map::new(),
        }
    }

    pub fn slot(&self) -> Slot {
        Slot::new(self.date.clone(), self.time.clone())
    }

    /// Whether this appointment holds its slot
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

/// Partial update: `Some` fields overwrite, `None` fields are kept
///
/// The optional booking fields take `Some(None)` to clear them, which is
/// what an explicit `null` in the JSON patch decodes to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentPatch {
    pub id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Option<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub service: Option<Option<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    pub status: Option<AppointmentStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Move to another slot
    pub fn reschedule(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            time: Some(time.into()),
            ..Self::default()
        }
    }

    pub fn apply(&self, appointment: &mut Appointment) {
        fn set<T: Clone>(field: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *field = v.clone();
            }
        }

        set(&mut appointment.id, &self.id);
        set(&mut appointment.date, &self.date);
        set(&mut appointment.time, &self.time);
        set(&mut appointment.customer_name, &self.customer_name);
        set(&mut appointment.customer_phone, &self.customer_phone);
        set(&mut appointment.status, &self.status);
        set(&mut appointment.customer_email, &self.customer_email);
        set(&mut appointment.service, &self.service);
        set(&mut appointment.notes, &self.notes);
        for (key, value) in &self.extra {
            appointment.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A key that is present decodes to `Some`, even when its value is `null`
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Appointments, blocked slots and the selected slot
#[derive(Debug)]
pub struct AppointmentStore<S> {
    cache: StorageCache<S>,
    appointments: Vec<Appointment>,
    blocked_slots: Vec<Slot>,
    /// Not persisted
    selected_slot: Option<Slot>,
}

impl<S: KeyValueStore> AppointmentStore<S> {
    /// Empty store; call `load` to pick up persisted data
    pub fn new(cache: StorageCache<S>) -> Self {
        Self {
            cache,
            appointments: Vec::new(),
            blocked_slots: Vec::new(),
            selected_slot: None,
        }
    }

    /// Store with persisted data already loaded
    pub fn open(cache: StorageCache<S>) -> Self {
        let mut store = Self::new(cache);
        store.load();
        store
    }

    pub fn cache(&self) -> &StorageCache<S> {
        &self.cache
    }

    /// Replace in-memory appointments and blocked slots with persisted ones
    pub fn load(&mut self) {
        self.appointments = self.cache.get_appointments();
        self.blocked_slots = self.cache.get_blocked_slots();
        log::info!(
            "Loaded {} appointments, {} blocked slots",
            self.appointments.len(),
            self.blocked_slots.len()
        );
    }

    /// Append an appointment and persist
    pub fn add(&mut self, appointment: Appointment) -> Result<()> {
        if self.get(&appointment.id).is_some() {
            log::warn!("Adding appointment with duplicate id '{}'", appointment.id);
        }
        self.appointments.push(appointment);
        self.save_appointments()
    }

    /// Apply `patch` to every appointment with `id` and persist
    ///
    /// Returns how many appointments matched.
    pub fn update(&mut self, id: &str, patch: &AppointmentPatch) -> Result<usize> {
        let mut matched = 0;
        for appointment in self.appointments.iter_mut().filter(|a| a.id == id) {
            patch.apply(appointment);
            matched += 1;
        }
        self.save_appointments()?;
        Ok(matched)
    }

    /// Drop every appointment with `id` and persist
    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.appointments.retain(|a| a.id != id);
        self.save_appointments()
    }

    /// Mark a slot unavailable; blocking twice is a no-op
    pub fn block_time_slot(&mut self, date: &str, time: &str) -> Result<()> {
        if self.is_slot_blocked(date, time) {
            return Ok(());
        }
        self.blocked_slots.push(Slot::new(date, time));
        self.save_blocked_slots()
    }

    pub fn unblock_time_slot(&mut self, date: &str, time: &str) -> Result<()> {
        self.blocked_slots.retain(|s| !s.matches(date, time));
        self.save_blocked_slots()
    }

    pub fn is_slot_blocked(&self, date: &str, time: &str) -> bool {
        self.blocked_slots.iter().any(|s| s.matches(date, time))
    }

    /// Whether a non-cancelled appointment holds the slot
    pub fn is_slot_booked(&self, date: &str, time: &str) -> bool {
        self.appointments
            .iter()
            .any(|a| a.occupies_slot() && a.date == date && a.time == time)
    }

    /// Neither blocked nor booked
    pub fn is_slot_available(&self, date: &str, time: &str) -> bool {
        !self.is_slot_blocked(date, time) && !self.is_slot_booked(date, time)
    }

    pub fn set_selected_slot(&mut self, date: &str, time: &str) {
        self.selected_slot = Some(Slot::new(date, time));
    }

    pub fn clear_selected_slot(&mut self) {
        self.selected_slot = None;
    }

    pub fn selected_slot(&self) -> Option<&Slot> {
        self.selected_slot.as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Appointments on `date`, ordered by time
    pub fn appointments_on(&self, date: &str) -> Vec<&Appointment> {
        let mut day: Vec<_> = self.appointments.iter().filter(|a| a.date == date).collect();
        day.sort_by(|a, b| a.time.cmp(&b.time));
        day
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn blocked_slots(&self) -> &[Slot] {
        &self.blocked_slots
    }

    fn save_appointments(&self) -> Result<()> {
        self.cache.set_appointments(&self.appointments)
    }

    fn save_blocked_slots(&self) -> Result<()> {
        self.cache.set_blocked_slots(&self.blocked_slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use proptest::prelude::*;

    fn store() -> AppointmentStore<MemoryStorage> {
        AppointmentStore::open(StorageCache::new(MemoryStorage::new()))
    }

    fn booking(id: &str, date: &str, time: &str) -> Appointment {
        let mut a = Appointment::new(id, date, time, "Ada Lovelace", "555-0100");
        a.service = Some("Haircut".to_string());
        a
    }

    #[test]
    fn test_open_loads_persisted_data() {
        let appointments = serde_json::to_string(&[booking("1", "2024-05-01", "10:00")]).unwrap();
        let storage = MemoryStorage::new()
            .with_item("appointments", &appointments)
            .with_item("blockedSlots", r#"[{"date":"2024-05-01","time":"12:00"}]"#);

        let store = AppointmentStore::open(StorageCache::new(storage));
        assert_eq!(store.appointments().len(), 1);
        assert!(store.is_slot_blocked("2024-05-01", "12:00"));
        assert!(store.selected_slot().is_none());
    }

    #[test]
    fn test_add_persists() {
        let mut store = store();
        store.add(booking("1", "2024-05-01", "10:00")).unwrap();
        assert_eq!(store.cache().get_appointments(), vec![booking("1", "2024-05-01", "10:00")]);
    }

    #[test]
    fn test_add_duplicate_id_is_accepted() {
        let mut store = store();
        store.add(booking("1", "2024-05-01", "10:00")).unwrap();
        store.add(booking("1", "2024-05-02", "11:00")).unwrap();
        assert_eq!(store.appointments().len(), 2);

        // Update and delete act on every match
        assert_eq!(
            store
                .update("1", &AppointmentPatch::status(AppointmentStatus::Confirmed))
                .unwrap(),
            2
        );
        store.delete("1").unwrap();
        assert!(store.appointments().is_empty());
    }

    #[test]
    fn test_update_preserves_unpatched_fields() {
        let mut store = store();
        let mut original = booking("7", "2024-05-01", "10:00");
        original.notes = Some("First visit".to_string());
        original
            .extra
            .insert("stylist".to_string(), Value::String("Grace".to_string()));
        store.add(original.clone()).unwrap();

        let patch = AppointmentPatch {
            time: Some("11:30".to_string()),
            customer_email: Some(Some("ada@example.com".to_string())),
            ..Default::default()
        };
        assert_eq!(store.update("7", &patch).unwrap(), 1);

        let updated = store.get("7").unwrap();
        assert_eq!(updated.time, "11:30");
        assert_eq!(updated.customer_email.as_deref(), Some("ada@example.com"));
        assert_eq!(updated.date, original.date);
        assert_eq!(updated.customer_name, original.customer_name);
        assert_eq!(updated.notes, original.notes);
        assert_eq!(updated.service, original.service);
        assert_eq!(updated.extra, original.extra);
        assert_eq!(store.cache().get_appointments()[0].time, "11:30");
    }

    #[test]
    fn test_update_unknown_id_changes_nothing() {
        let mut store = store();
        store.add(booking("1", "2024-05-01", "10:00")).unwrap();
        let patch = AppointmentPatch::reschedule("2024-06-01", "09:00");
        assert_eq!(store.update("nope", &patch).unwrap(), 0);
        assert_eq!(store.get("1").unwrap().date, "2024-05-01");
    }

    #[test]
    fn test_patch_from_partial_json() {
        let patch: AppointmentPatch =
            serde_json::from_str(r#"{"status":"cancelled","color":"red"}"#).unwrap();
        let mut a = booking("1", "2024-05-01", "10:00");
        patch.apply(&mut a);
        assert_eq!(a.status, AppointmentStatus::Cancelled);
        assert_eq!(a.extra.get("color"), Some(&Value::String("red".to_string())));
        assert_eq!(a.customer_name, "Ada Lovelace");
    }

    #[test]
    fn test_patch_null_clears_optional_field() {
        let patch: AppointmentPatch = serde_json::from_str(r#"{"notes":null}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.service, None);

        let mut a = booking("1", "2024-05-01", "10:00");
        a.notes = Some("old".to_string());
        patch.apply(&mut a);

        assert_eq!(a.notes, None);
        assert_eq!(a.service.as_deref(), Some("Haircut"));
    }

    #[test]
    fn test_update_with_null_persists_cleared_field() {
        let mut store = store();
        let mut original = booking("1", "2024-05-01", "10:00");
        original.customer_email = Some("ada@example.com".to_string());
        store.add(original).unwrap();

        let patch: AppointmentPatch =
            serde_json::from_str(r#"{"customerEmail":null,"status":"confirmed"}"#).unwrap();
        store.update("1", &patch).unwrap();

        let saved = &store.cache().get_appointments()[0];
        assert_eq!(saved.customer_email, None);
        assert_eq!(saved.status, AppointmentStatus::Confirmed);
        assert_eq!(saved.service.as_deref(), Some("Haircut"));
    }

    #[test]
    fn test_open_keeps_records_around_a_malformed_one() {
        let json = r#"[
            {"id":"1","date":"2024-05-01","time":"10:00","customerName":"A","customerPhone":"1"},
            {"id":"2","date":"2024-05-01","time":"11:00","customerName":"B"},
            {"id":"3","date":"2024-05-01"}
        ]"#;
        let storage = MemoryStorage::new().with_item("appointments", json);
        let mut store = AppointmentStore::open(StorageCache::new(storage));

        // Missing payload fields default; a missing slot time is unusable
        assert_eq!(store.appointments().len(), 2);
        assert_eq!(store.get("2").unwrap().customer_phone, "");

        store.add(booking("4", "2024-05-02", "09:00")).unwrap();
        let ids: Vec<_> = store
            .cache()
            .get_appointments()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }

    #[test]
    fn test_unknown_fields_round_trip_through_storage() {
        let json = r#"[{"id":"1","date":"2024-05-01","time":"10:00","customerName":"A","customerPhone":"1","deposit":25}]"#;
        let storage = MemoryStorage::new().with_item("appointments", json);
        let mut store = AppointmentStore::open(StorageCache::new(storage));
        store.delete("other").unwrap();

        let saved = store.cache().backend().item("appointments").unwrap();
        assert!(saved.contains(r#""deposit":25"#));
    }

    #[test]
    fn test_delete_removes_and_persists() {
        let mut store = store();
        store.add(booking("1", "2024-05-01", "10:00")).unwrap();
        store.add(booking("2", "2024-05-01", "11:00")).unwrap();
        store.delete("1").unwrap();

        assert!(store.get("1").is_none());
        let persisted = store.cache().get_appointments();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, "2");
    }

    #[test]
    fn test_block_then_unblock() {
        let mut store = store();
        store.block_time_slot("2024-05-01", "10:00").unwrap();
        assert!(store.is_slot_blocked("2024-05-01", "10:00"));
        assert!(!store.is_slot_blocked("2024-05-01", "10:30"));
        assert_eq!(store.cache().get_blocked_slots().len(), 1);

        store.unblock_time_slot("2024-05-01", "10:00").unwrap();
        assert!(!store.is_slot_blocked("2024-05-01", "10:00"));
        assert!(store.cache().get_blocked_slots().is_empty());
    }

    #[test]
    fn test_block_twice_does_not_duplicate() {
        let mut store = store();
        store.block_time_slot("2024-05-01", "10:00").unwrap();
        store.cache().backend().clear_calls();
        store.block_time_slot("2024-05-01", "10:00").unwrap();

        assert_eq!(store.blocked_slots().len(), 1);
        assert!(store.cache().backend().writes().is_empty());
    }

    #[test]
    fn test_unblock_removes_duplicates_loaded_from_storage() {
        let storage = MemoryStorage::new().with_item(
            "blockedSlots",
            r#"[{"date":"d","time":"t"},{"date":"d","time":"t"}]"#,
        );
        let mut store = AppointmentStore::open(StorageCache::new(storage));
        store.unblock_time_slot("d", "t").unwrap();
        assert!(!store.is_slot_blocked("d", "t"));
    }

    #[test]
    fn test_selected_slot_is_never_persisted() {
        let mut store = store();
        store.cache().backend().clear_calls();

        store.set_selected_slot("2024-05-01", "10:00");
        assert_eq!(store.selected_slot(), Some(&Slot::new("2024-05-01", "10:00")));
        store.set_selected_slot("2024-05-01", "11:00");
        store.clear_selected_slot();
        assert!(store.selected_slot().is_none());

        assert!(store.cache().backend().calls().is_empty());
    }

    #[test]
    fn test_slot_availability() {
        let mut store = store();
        store.add(booking("1", "2024-05-01", "10:00")).unwrap();
        store.block_time_slot("2024-05-01", "12:00").unwrap();

        assert!(store.is_slot_booked("2024-05-01", "10:00"));
        assert!(!store.is_slot_available("2024-05-01", "10:00"));
        assert!(!store.is_slot_available("2024-05-01", "12:00"));
        assert!(store.is_slot_available("2024-05-01", "14:00"));

        // Cancelled bookings free the slot
        store
            .update("1", &AppointmentPatch::status(AppointmentStatus::Cancelled))
            .unwrap();
        assert!(store.is_slot_available("2024-05-01", "10:00"));
    }

    #[test]
    fn test_appointments_on_sorted_by_time() {
        let mut store = store();
        store.add(booking("a", "2024-05-01", "15:00")).unwrap();
        store.add(booking("b", "2024-05-02", "09:00")).unwrap();
        store.add(booking("c", "2024-05-01", "09:30")).unwrap();

        let ids: Vec<_> = store
            .appointments_on("2024-05-01")
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_failed_write_reports_error() {
        let mut store = store();
        store.cache().backend().set_fail_writes(true);
        assert!(store.block_time_slot("2024-05-01", "10:00").is_err());
        assert!(store.is_slot_blocked("2024-05-01", "10:00"));
    }

    proptest! {
        #[test]
        fn prop_block_unblock(
            slots in prop::collection::vec(("[0-9]{1,2}", "[0-9]{1,2}"), 0..8),
            date in "[0-9]{1,2}",
            time in "[0-9]{1,2}",
        ) {
            let mut store = store();
            for (d, t) in &slots {
                store.block_time_slot(d, t).unwrap();
            }

            store.block_time_slot(&date, &time).unwrap();
            prop_assert!(store.is_slot_blocked(&date, &time));

            store.unblock_time_slot(&date, &time).unwrap();
            prop_assert!(!store.is_slot_blocked(&date, &time));

            // Other slots are untouched
            for (d, t) in &slots {
                if !(d == &date && t == &time) {
                    prop_assert!(store.is_slot_blocked(d, t));
                }
            }
        }

        #[test]
        fn prop_patch_preserves_absent_fields(
            notes in proptest::option::of("[a-z ]{0,12}"),
            service in proptest::option::of("[a-z]{0,8}"),
        ) {
            let mut original = booking("1", "2024-05-01", "10:00");
            original.notes = Some("keep".to_string());
            let patch = AppointmentPatch {
                notes: notes.clone().map(Some),
                service: service.clone().map(Some),
                ..Default::default()
            };

            let mut updated = original.clone();
            patch.apply(&mut updated);

            prop_assert_eq!(&updated.id, &original.id);
            prop_assert_eq!(&updated.date, &original.date);
            prop_assert_eq!(&updated.time, &original.time);
            prop_assert_eq!(&updated.customer_phone, &original.customer_phone);
            prop_assert_eq!(updated.notes, notes.or(original.notes));
            prop_assert_eq!(updated.service, service.or(original.service));
        }
    }
}
