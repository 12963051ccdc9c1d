//! In-memory `RemoteStore` for testing.
//!
//! Behaves like the document store: per-user day documents with an additive
//! counter, one document per intake, a settings document per user. On top of
//! that it can be told to fail, to answer slowly, to never answer, or to act
//! as if the ordered-query index was never deployed.
//!
//! ```rust,ignore
//! use hydrosync::remote::{ErrorInjection, MockRemoteStore, RemoteErrorKind};
//!
//! let remote = MockRemoteStore::new();
//! remote.inject_error(ErrorInjection::Operation(
//!     "add_intake".into(),
//!     RemoteErrorKind::PermissionDenied,
//! ));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::{RemoteError, RemoteErrorKind, RemoteResult, RemoteStore, with_index_fallback};
use crate::model::{DailyRecord, DayKey, DayStats, IntakeEvent, ReminderSettings, UserId};

/// Error injection configuration for testing.
#[derive(Debug, Clone)]
pub enum ErrorInjection {
    /// Fail all operations with this error.
    All(RemoteErrorKind),

    /// Fail a specific operation (by name) with this error.
    Operation(String, RemoteErrorKind),
}

#[derive(Debug, Clone)]
struct DayDoc {
    total_ml: u32,
    goal_ml: u32,
    /// Insertion order, like an unindexed collection scan.
    intakes: Vec<IntakeEvent>,
}

#[derive(Debug, Default)]
struct MockState {
    days: HashMap<(UserId, DayKey), DayDoc>,
    settings: HashMap<UserId, ReminderSettings>,
}

/// Mock remote document store.
#[derive(Debug, Default)]
pub struct MockRemoteStore {
    state: Mutex<MockState>,
    error_on: Mutex<Option<ErrorInjection>>,
    latency: Mutex<Option<Duration>>,
    hang: AtomicBool,
    missing_index: AtomicBool,
    index_fallbacks: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a day document from a record.
    pub fn insert_day(&self, user: &UserId, record: &DailyRecord) {
        self.state.lock().days.insert(
            (user.clone(), record.day_key),
            DayDoc {
                total_ml: record.consumed_ml,
                goal_ml: record.goal_ml,
                intakes: record.history.clone(),
            },
        );
    }

    /// Current day document as a record, if one exists.
    pub fn day(&self, user: &UserId, day: DayKey) -> Option<DailyRecord> {
        self.state
            .lock()
            .days
            .get(&(user.clone(), day))
            .map(|doc| DailyRecord {
                consumed_ml: doc.total_ml,
                goal_ml: doc.goal_ml,
                history: doc.intakes.clone(),
                day_key: day,
            })
    }

    pub fn insert_settings(&self, user: &UserId, settings: ReminderSettings) {
        self.state.lock().settings.insert(user.clone(), settings);
    }

    pub fn settings(&self, user: &UserId) -> Option<ReminderSettings> {
        self.state.lock().settings.get(user).cloned()
    }

    pub fn inject_error(&self, injection: ErrorInjection) {
        *self.error_on.lock() = Some(injection);
    }

    pub fn clear_errors(&self) {
        *self.error_on.lock() = None;
    }

    /// Delay every call by `latency` before answering.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Never answer any call while set.
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Reject ordered queries with `FailedPrecondition`.
    pub fn set_missing_index(&self, missing: bool) {
        self.missing_index.store(missing, Ordering::SeqCst);
    }

    /// How many ordered queries fell back to in-memory sorting.
    pub fn index_fallbacks(&self) -> usize {
        self.index_fallbacks.load(Ordering::SeqCst)
    }

    /// Operation names in the order the calls started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == op).count()
    }

    async fn enter(&self, op: &str) -> RemoteResult<()> {
        self.calls.lock().push(op.to_string());

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let injected = self.error_on.lock().clone();
        match injected {
            Some(ErrorInjection::All(kind)) => Err(mock_error(kind, op)),
            Some(ErrorInjection::Operation(target, kind)) if target == op => {
                Err(mock_error(kind, op))
            }
            _ => Ok(()),
        }
    }

    fn ordered_query<T>(&self, items: Vec<T>) -> RemoteResult<Vec<T>> {
        if self.missing_index.load(Ordering::SeqCst) {
            self.index_fallbacks.fetch_add(1, Ordering::SeqCst);
            return Err(RemoteError::failed_precondition(
                "the query requires an index",
            ));
        }
        Ok(items)
    }
}

fn mock_error(kind: RemoteErrorKind, op: &str) -> RemoteError {
    RemoteError::new(kind, format!("mock error: {op}"))
}

impl RemoteStore for MockRemoteStore {
    async fn fetch_day(&self, user: &UserId, day: DayKey) -> RemoteResult<Option<DailyRecord>> {
        self.enter("fetch_day").await?;

        let Some(doc) = self
            .state
            .lock()
            .days
            .get(&(user.clone(), day))
            .cloned()
        else {
            return Ok(None);
        };

        let unordered = doc.intakes.clone();
        let mut sorted = doc.intakes;
        sorted.sort_by_key(|e| e.occurred_at);
        let history = with_index_fallback(
            "intakes",
            async move { self.ordered_query(sorted) },
            async move { Ok(unordered) },
            |items: &mut Vec<IntakeEvent>| items.sort_by_key(|e| e.occurred_at),
        )
        .await?;

        Ok(Some(DailyRecord {
            consumed_ml: doc.total_ml,
            goal_ml: doc.goal_ml,
            history,
            day_key: day,
        }))
    }

    async fn put_day(&self, user: &UserId, record: &DailyRecord) -> RemoteResult<()> {
        self.enter("put_day").await?;

        let mut state = self.state.lock();
        let doc = state
            .days
            .entry((user.clone(), record.day_key))
            .or_insert_with(|| DayDoc {
                total_ml: 0,
                goal_ml: record.goal_ml,
                intakes: Vec::new(),
            });
        for event in &record.history {
            if let Some(existing) = doc.intakes.iter_mut().find(|e| e.id == event.id) {
                *existing = event.clone();
            } else {
                doc.intakes.push(event.clone());
            }
        }
        doc.total_ml = record.consumed_ml;
        doc.goal_ml = record.goal_ml;
        Ok(())
    }

    async fn add_intake(
        &self,
        user: &UserId,
        day: DayKey,
        event: &IntakeEvent,
        goal_ml: u32,
    ) -> RemoteResult<()> {
        self.enter("add_intake").await?;

        let mut state = self.state.lock();
        let doc = state
            .days
            .entry((user.clone(), day))
            .or_insert_with(|| DayDoc {
                total_ml: 0,
                goal_ml,
                intakes: Vec::new(),
            });
        // Intake documents are keyed by event id, so a replay overwrites.
        if let Some(existing) = doc.intakes.iter_mut().find(|e| e.id == event.id) {
            *existing = event.clone();
        } else {
            doc.intakes.push(event.clone());
            doc.total_ml = doc.total_ml.saturating_add(event.amount_ml);
        }
        doc.goal_ml = goal_ml;
        Ok(())
    }

    async fn reset_day(&self, user: &UserId, day: DayKey, goal_ml: u32) -> RemoteResult<()> {
        self.enter("reset_day").await?;

        self.state.lock().days.insert(
            (user.clone(), day),
            DayDoc {
                total_ml: 0,
                goal_ml,
                intakes: Vec::new(),
            },
        );
        Ok(())
    }

    async fn set_goal(&self, user: &UserId, day: DayKey, goal_ml: u32) -> RemoteResult<()> {
        self.enter("set_goal").await?;

        let mut state = self.state.lock();
        state
            .days
            .entry((user.clone(), day))
            .and_modify(|doc| doc.goal_ml = goal_ml)
            .or_insert_with(|| DayDoc {
                total_ml: 0,
                goal_ml,
                intakes: Vec::new(),
            });
        Ok(())
    }

    async fn load_settings(&self, user: &UserId) -> RemoteResult<ReminderSettings> {
        self.enter("load_settings").await?;
        Ok(self.settings(user).unwrap_or_default())
    }

    async fn save_settings(&self, user: &UserId, settings: &ReminderSettings) -> RemoteResult<()> {
        self.enter("save_settings").await?;
        self.insert_settings(user, settings.clone());
        Ok(())
    }

    async fn day_stats(&self, user: &UserId, since: DayKey) -> RemoteResult<Vec<DayStats>> {
        self.enter("day_stats").await?;

        let unordered: Vec<DayStats> = self
            .state
            .lock()
            .days
            .iter()
            .filter(|((owner, day), _)| owner == user && *day >= since)
            .map(|((_, day), doc)| DayStats {
                day_key: *day,
                total_ml: doc.total_ml,
                goal_ml: doc.goal_ml,
            })
            .collect();

        let mut ordered = unordered.clone();
        ordered.sort_by(|a, b| b.day_key.cmp(&a.day_key));
        with_index_fallback(
            "day_stats",
            async move { self.ordered_query(ordered) },
            async move { Ok(unordered) },
            |items: &mut Vec<DayStats>| items.sort_by(|a, b| b.day_key.cmp(&a.day_key)),
        )
        .await
    }
}
