//! Typed snapshot adapter over a [`LocalStore`].
//!
//! The local tier is treated as always healthy: read failures and corrupt
//! blobs come back as "absent", write failures are logged and dropped.
//! Nothing in here returns an error to the caller.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use crate::model::{DailyRecord, ReminderSettings};
use crate::storage::LocalStore;

/// Key of the daily record snapshot.
pub const DAILY_RECORD_KEY: &str = "daily_record";
/// Key of the reminder settings snapshot.
pub const REMINDER_SETTINGS_KEY: &str = "reminder_settings";

#[derive(Debug)]
pub struct SnapshotStore<L> {
    inner: L,
}

impl<L: LocalStore> SnapshotStore<L> {
    pub const fn new(inner: L) -> Self {
        Self { inner }
    }

    pub const fn inner(&self) -> &L {
        &self.inner
    }

    pub fn load_record(&self) -> Option<DailyRecord> {
        self.load(DAILY_RECORD_KEY)
    }

    /// Returns whether the snapshot reached the store.
    pub fn save_record(&self, record: &DailyRecord) -> bool {
        self.save(DAILY_RECORD_KEY, record)
    }

    pub fn load_settings(&self) -> Option<ReminderSettings> {
        self.load(REMINDER_SETTINGS_KEY)
    }

    /// Returns whether the snapshot reached the store.
    pub fn save_settings(&self, settings: &ReminderSettings) -> bool {
        self.save(REMINDER_SETTINGS_KEY, settings)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.inner.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                trace!(key, "no local snapshot");
                return None;
            }
            Err(err) => {
                warn!(key, error = %err, "local read failed, treating snapshot as absent");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "local snapshot is unreadable, treating as absent");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key, error = %err, "could not encode local snapshot, dropping write");
                return false;
            }
        };
        if let Err(err) = self.inner.set(key, &bytes) {
            warn!(key, error = %err, "local write failed, dropping");
            return false;
        }
        true
    }
}
