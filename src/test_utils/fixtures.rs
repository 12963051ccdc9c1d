use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use crate::clock::ManualClock;
use crate::config::Config;
use crate::model::{DailyRecord, DayKey, IntakeEvent, UserId};
use crate::remote::MockRemoteStore;
use crate::session::SessionHandle;
use crate::storage::{MemoryStore, SqliteStore};
use crate::sync::{AvailabilityState, SyncEngine, SyncOptions};

pub type FixtureEngine =
    SyncEngine<Arc<MemoryStore>, Arc<MockRemoteStore>, SessionHandle, Arc<ManualClock>>;

pub const FIXTURE_USER: &str = "user-1";

/// 2024-03-10 09:00 UTC, the instant every fixture clock starts at.
#[must_use]
pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0)
        .single()
        .expect("fixed instant is unambiguous")
}

#[must_use]
pub fn fixed_day() -> DayKey {
    DayKey::from_date(fixed_instant().date_naive())
}

/// Availability already classified as usable.
#[must_use]
pub fn available_state() -> AvailabilityState {
    let state = AvailabilityState::new();
    state.record_probe(true);
    state
}

/// A record for `day` holding one event per amount, a minute apart from
/// `start`.
#[must_use]
pub fn record_with(day: DayKey, goal_ml: u32, amounts: &[u32], start: DateTime<Utc>) -> DailyRecord {
    let mut record = DailyRecord::fresh(day, goal_ml);
    for (i, amount) in amounts.iter().enumerate() {
        let at = start + Duration::minutes(i64::try_from(i).unwrap_or(i64::MAX));
        record.record_intake(IntakeEvent::new(*amount, at));
    }
    record
}

/// Engine over in-memory collaborators, with handles to each of them.
pub struct EngineFixture {
    pub engine: FixtureEngine,
    pub local: Arc<MemoryStore>,
    pub remote: Arc<MockRemoteStore>,
    pub session: SessionHandle,
    pub clock: Arc<ManualClock>,
}

impl EngineFixture {
    /// Signed in, availability not yet tested.
    #[must_use]
    pub fn new() -> Self {
        Self::with_availability(AvailabilityState::new())
    }

    /// Signed in, remote already known to be reachable.
    #[must_use]
    pub fn available() -> Self {
        Self::with_availability(available_state())
    }

    #[must_use]
    pub fn with_availability(availability: AvailabilityState) -> Self {
        Self::build(availability, SyncOptions::default())
    }

    #[must_use]
    pub fn build(availability: AvailabilityState, options: SyncOptions) -> Self {
        let local = Arc::new(MemoryStore::new());
        let remote = Arc::new(MockRemoteStore::new());
        let session = SessionHandle::signed_in(UserId::new(FIXTURE_USER));
        let clock = Arc::new(ManualClock::new(fixed_instant()));
        let engine = SyncEngine::with_availability(
            Arc::clone(&local),
            Some(Arc::clone(&remote)),
            session.clone(),
            Arc::clone(&clock),
            options,
            availability,
        );
        println!("[FIXTURE] Engine at {} for {FIXTURE_USER}", fixed_instant());
        Self {
            engine,
            local,
            remote,
            session,
            clock,
        }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        UserId::new(FIXTURE_USER)
    }
}

impl Default for EngineFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Isolated data directory for config and SQLite tests.
pub struct DataDirFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl DataDirFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {}", data_path.display());

        Self {
            temp_dir,
            data_path,
        }
    }

    /// Default config rooted at this directory.
    #[must_use]
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.data_dir.clone_from(&self.data_path);
        config
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_path.join("local.db")
    }

    #[must_use]
    pub fn open_sqlite(&self) -> SqliteStore {
        SqliteStore::open(self.db_path()).expect("Failed to open sqlite store")
    }
}

impl Default for DataDirFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DataDirFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {}", self.data_path.display());
    }
}
