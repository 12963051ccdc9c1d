//! Wall-clock capability.
//!
//! Day rollover compares against "today" in the process-local calendar.
//! Everything that needs the time goes through [`Clock`] so tests can pin it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use parking_lot::Mutex;

use crate::model::DayKey;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()` in the local timezone.
    fn today(&self) -> DayKey;
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> DayKey {
        (**self).today()
    }
}

/// The real clock, local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> DayKey {
        DayKey::from_date(Local::now().date_naive())
    }
}

/// Settable clock for tests. Its "local" calendar is UTC.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn today(&self) -> DayKey {
        DayKey::from_date(self.now.lock().date_naive())
    }
}
