//! Domain types shared by the stores, the sync engine and the CLI.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HydroError, Result};

/// Goal used for a brand-new record when nothing else is known.
pub const DEFAULT_GOAL_ML: u32 = 2000;

/// Identity of the signed-in user, as handed out by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar day a record belongs to, in the process-local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// The day `days` before this one, saturating at the calendar minimum.
    #[must_use]
    pub fn days_before(self, days: u32) -> Self {
        self.0
            .checked_sub_days(chrono::Days::new(u64::from(days)))
            .map_or(self, Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = HydroError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|err| HydroError::Validation(format!("invalid day key {s:?}: {err}")))
    }
}

/// One logged drink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeEvent {
    /// Locally generated; doubles as the remote document id.
    pub id: String,
    pub amount_ml: u32,
    pub occurred_at: DateTime<Utc>,
}

impl IntakeEvent {
    #[must_use]
    pub fn new(amount_ml: u32, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            amount_ml,
            occurred_at,
        }
    }
}

/// Aggregate consumption for one user on one calendar day.
///
/// `consumed_ml` is always the sum of `history`; every mutator goes through
/// [`DailyRecord::recompute`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub consumed_ml: u32,
    pub goal_ml: u32,
    #[serde(default)]
    pub history: Vec<IntakeEvent>,
    pub day_key: DayKey,
}

impl DailyRecord {
    /// A zeroed record for `day_key`.
    #[must_use]
    pub const fn fresh(day_key: DayKey, goal_ml: u32) -> Self {
        Self {
            consumed_ml: 0,
            goal_ml,
            history: Vec::new(),
            day_key,
        }
    }

    /// Append an event, keeping `occurred_at` non-decreasing.
    pub fn record_intake(&mut self, mut event: IntakeEvent) {
        if let Some(last) = self.history.last() {
            if event.occurred_at < last.occurred_at {
                event.occurred_at = last.occurred_at;
            }
        }
        self.history.push(event);
        self.recompute();
    }

    pub fn clear(&mut self, day_key: DayKey) {
        self.history.clear();
        self.day_key = day_key;
        self.recompute();
    }

    /// Re-derive `consumed_ml` from the event history.
    pub fn recompute(&mut self) {
        let total: u64 = self.history.iter().map(|e| u64::from(e.amount_ml)).sum();
        self.consumed_ml = u32::try_from(total).unwrap_or(u32::MAX);
    }

    /// Sort history chronologically and recompute the aggregate.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.history.sort_by_key(|e| e.occurred_at);
        self.recompute();
        self
    }

    /// Fraction of the goal reached, capped at 1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.goal_ml == 0 {
            return 0.0;
        }
        (f64::from(self.consumed_ml) / f64::from(self.goal_ml)).min(1.0)
    }

    #[must_use]
    pub const fn remaining_ml(&self) -> u32 {
        self.goal_ml.saturating_sub(self.consumed_ml)
    }
}

/// Per-day aggregate returned by the remote historical query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub day_key: DayKey,
    pub total_ml: u32,
    pub goal_ml: u32,
}

/// Clock time within a day, serialized as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(HydroError::Validation(format!(
                "invalid time of day {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Minutes elapsed since midnight.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    /// Inverse of [`TimeOfDay::minutes`]; `None` past 23:59.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes >= 24 * 60 {
            return None;
        }
        let hour = u8::try_from(minutes / 60).ok()?;
        let minute = u8::try_from(minutes % 60).ok()?;
        Some(Self { hour, minute })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = HydroError;

    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| HydroError::Validation(format!("expected HH:MM, got {s:?}")))?;
        let hour = h
            .trim()
            .parse::<u8>()
            .map_err(|_| HydroError::Validation(format!("invalid hour in {s:?}")))?;
        let minute = m
            .trim()
            .parse::<u8>()
            .map_err(|_| HydroError::Validation(format!("invalid minute in {s:?}")))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = HydroError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Reminder configuration; process-wide, not per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
    #[serde(default = "default_window_start")]
    pub window_start: TimeOfDay,
    #[serde(default = "default_window_end")]
    pub window_end: TimeOfDay,
    #[serde(default = "default_amount")]
    pub amount_ml: u32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_interval() -> u32 {
    60
}

const fn default_window_start() -> TimeOfDay {
    TimeOfDay { hour: 8, minute: 0 }
}

const fn default_window_end() -> TimeOfDay {
    TimeOfDay { hour: 22, minute: 0 }
}

const fn default_amount() -> u32 {
    250
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_minutes: default_interval(),
            window_start: default_window_start(),
            window_end: default_window_end(),
            amount_ml: default_amount(),
        }
    }
}

impl ReminderSettings {
    pub fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            return Err(HydroError::Validation(
                "reminder interval must be positive".to_string(),
            ));
        }
        if self.amount_ml == 0 {
            return Err(HydroError::Validation(
                "reminder amount must be positive".to_string(),
            ));
        }
        if self.window_start >= self.window_end {
            return Err(HydroError::Validation(format!(
                "reminder window start {} must be before end {}",
                self.window_start, self.window_end
            )));
        }
        Ok(())
    }
}

/// Reject zero and negative milliliter inputs before any I/O happens.
pub fn positive_ml(value: i64, field: &str) -> Result<u32> {
    if value <= 0 {
        return Err(HydroError::Validation(format!(
            "{field} must be positive, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| HydroError::Validation(format!("{field} is too large: {value}")))
}
