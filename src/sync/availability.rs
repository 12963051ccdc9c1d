//! Advisory remote-availability flag.
//!
//! `untested -> {available | unavailable}` via the probe, then flips between
//! the two on remote outcomes. It never goes back to untested.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Untested,
    Available,
    Unavailable,
}

impl Availability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Untested => "untested",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned by the sync engine; last completion wins.
#[derive(Debug, Default)]
pub struct AvailabilityState {
    tested: AtomicBool,
    available: AtomicBool,
}

impl AvailabilityState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tested: AtomicBool::new(false),
            available: AtomicBool::new(false),
        }
    }

    pub fn get(&self) -> Availability {
        if !self.tested.load(Ordering::Acquire) {
            return Availability::Untested;
        }
        if self.available.load(Ordering::Acquire) {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    /// Whether remote calls should be attempted at all.
    pub fn is_usable(&self) -> bool {
        self.get() == Availability::Available
    }

    /// Record a probe outcome. Returns whether the state changed.
    pub fn record_probe(&self, reachable: bool) -> bool {
        self.set(reachable)
    }

    /// Returns whether the state changed.
    pub fn mark_available(&self) -> bool {
        self.set(true)
    }

    /// Returns whether the state changed.
    pub fn mark_unavailable(&self) -> bool {
        self.set(false)
    }

    fn set(&self, available: bool) -> bool {
        let before = self.get();
        self.available.store(available, Ordering::Release);
        self.tested.store(true, Ordering::Release);
        before != self.get()
    }
}
