//! Local storage layer for hydrosync
//!
//! The on-device tier: a raw key-value [`LocalStore`] (SQLite on disk, or
//! memory) and the [`SnapshotStore`] adapter that holds the two persisted
//! snapshots and never surfaces a failure.

pub mod local;
pub mod migrations;
pub mod snapshot;
pub mod sqlite;

pub use local::{LocalStore, MemoryStore};
pub use snapshot::{DAILY_RECORD_KEY, REMINDER_SETTINGS_KEY, SnapshotStore};
pub use sqlite::SqliteStore;
