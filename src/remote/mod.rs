//! Remote document store.
//!
//! The remote tier is keyed by user identity and calendar day. It may be
//! slow, offline, or reject the session at any time; callers only ever see
//! a [`RemoteResult`] and decide what to do with the failure kind.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hydrosync::remote::{HttpRemoteStore, RemoteStore};
//!
//! let remote = HttpRemoteStore::new("https://docs.example.com", Some(api_key))?;
//! let record = remote.fetch_day(&user, today).await?;
//! ```

mod http;
pub mod mock;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::model::{DailyRecord, DayKey, DayStats, IntakeEvent, ReminderSettings, UserId};

pub use http::HttpRemoteStore;
pub use mock::{ErrorInjection, MockRemoteStore};

/// What went wrong on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Network down, DNS failure, server overloaded.
    Unavailable,
    /// The bounded wait ran out.
    Timeout,
    /// Access rules rejected the request.
    PermissionDenied,
    /// No valid session.
    Unauthenticated,
    /// The query needs a server-side index that does not exist.
    FailedPrecondition,
    NotFound,
    /// The response body did not match the expected document shape.
    InvalidResponse,
    Other,
}

impl RemoteErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::PermissionDenied => "permission_denied",
            Self::Unauthenticated => "unauthenticated",
            Self::FailedPrecondition => "failed_precondition",
            Self::NotFound => "not_found",
            Self::InvalidResponse => "invalid_response",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unavailable, message)
    }

    #[must_use]
    pub fn timeout(bound_ms: u128) -> Self {
        Self::new(
            RemoteErrorKind::Timeout,
            format!("no answer within {bound_ms}ms"),
        )
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::PermissionDenied, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unauthenticated, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::FailedPrecondition, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::InvalidResponse, message)
    }

    /// Network-level failure: the store could not be reached in time.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(
            self.kind,
            RemoteErrorKind::Unavailable | RemoteErrorKind::Timeout
        )
    }

    /// The store answered, but refused this session.
    #[must_use]
    pub const fn is_permission(&self) -> bool {
        matches!(
            self.kind,
            RemoteErrorKind::PermissionDenied | RemoteErrorKind::Unauthenticated
        )
    }

    /// Whether this failure should stop opportunistic mirroring.
    #[must_use]
    pub const fn marks_unavailable(&self) -> bool {
        self.is_unreachable() || self.is_permission()
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Contract of the remote document store.
///
/// All futures are `Send` so the sync engine can mirror writes from
/// background tasks.
pub trait RemoteStore: Send + Sync + 'static {
    /// Today's (or any day's) aggregate with its intake history, or `None`
    /// when the day has no stats document yet.
    fn fetch_day(
        &self,
        user: &UserId,
        day: DayKey,
    ) -> impl Future<Output = RemoteResult<Option<DailyRecord>>> + Send;

    /// Upload a whole day: every intake document, then the stats document
    /// set to the record's total and goal.
    fn put_day(
        &self,
        user: &UserId,
        record: &DailyRecord,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Store one intake document and bump the day's additive counter.
    fn add_intake(
        &self,
        user: &UserId,
        day: DayKey,
        event: &IntakeEvent,
        goal_ml: u32,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Delete the day's intake documents and zero its counter.
    fn reset_day(
        &self,
        user: &UserId,
        day: DayKey,
        goal_ml: u32,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    fn set_goal(
        &self,
        user: &UserId,
        day: DayKey,
        goal_ml: u32,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Stored settings, or defaults when the user has none.
    fn load_settings(
        &self,
        user: &UserId,
    ) -> impl Future<Output = RemoteResult<ReminderSettings>> + Send;

    /// Merge-save of the user's settings document.
    fn save_settings(
        &self,
        user: &UserId,
        settings: &ReminderSettings,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Per-day aggregates from `since` onwards, newest first.
    fn day_stats(
        &self,
        user: &UserId,
        since: DayKey,
    ) -> impl Future<Output = RemoteResult<Vec<DayStats>>> + Send;
}

impl<T: RemoteStore> RemoteStore for Arc<T> {
    fn fetch_day(
        &self,
        user: &UserId,
        day: DayKey,
    ) -> impl Future<Output = RemoteResult<Option<DailyRecord>>> + Send {
        (**self).fetch_day(user, day)
    }

    fn put_day(
        &self,
        user: &UserId,
        record: &DailyRecord,
    ) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).put_day(user, record)
    }

    fn add_intake(
        &self,
        user: &UserId,
        day: DayKey,
        event: &IntakeEvent,
        goal_ml: u32,
    ) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).add_intake(user, day, event, goal_ml)
    }

    fn reset_day(
        &self,
        user: &UserId,
        day: DayKey,
        goal_ml: u32,
    ) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).reset_day(user, day, goal_ml)
    }

    fn set_goal(
        &self,
        user: &UserId,
        day: DayKey,
        goal_ml: u32,
    ) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).set_goal(user, day, goal_ml)
    }

    fn load_settings(
        &self,
        user: &UserId,
    ) -> impl Future<Output = RemoteResult<ReminderSettings>> + Send {
        (**self).load_settings(user)
    }

    fn save_settings(
        &self,
        user: &UserId,
        settings: &ReminderSettings,
    ) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).save_settings(user, settings)
    }

    fn day_stats(
        &self,
        user: &UserId,
        since: DayKey,
    ) -> impl Future<Output = RemoteResult<Vec<DayStats>>> + Send {
        (**self).day_stats(user, since)
    }
}

/// Run an ordered query; if the server lacks the index for it, run the
/// unordered variant and sort in memory instead.
pub async fn with_index_fallback<T, Ordered, Unordered, Sort>(
    what: &str,
    ordered: Ordered,
    unordered: Unordered,
    sort: Sort,
) -> RemoteResult<Vec<T>>
where
    Ordered: Future<Output = RemoteResult<Vec<T>>>,
    Unordered: Future<Output = RemoteResult<Vec<T>>>,
    Sort: FnOnce(&mut Vec<T>),
{
    match ordered.await {
        Err(err) if err.kind == RemoteErrorKind::FailedPrecondition => {
            warn!(query = what, error = %err, "index missing, sorting in memory");
            let mut items = unordered.await?;
            sort(&mut items);
            Ok(items)
        }
        other => other,
    }
}

/// Milliseconds of a bound, for error messages.
pub(crate) const fn bound_ms(bound: Duration) -> u128 {
    bound.as_millis()
}
