//! Day rollover policy.

use crate::model::{DailyRecord, DayKey};

/// A record from an earlier day becomes a zeroed record for `today`,
/// keeping its goal. A record already keyed to `today` is returned as is.
#[must_use]
pub fn roll_over(record: DailyRecord, today: DayKey) -> DailyRecord {
    if record.day_key == today {
        return record;
    }
    DailyRecord::fresh(today, record.goal_ml)
}

/// Today's record from an optional snapshot.
#[must_use]
pub fn resolve_today(snapshot: Option<DailyRecord>, today: DayKey, default_goal_ml: u32) -> DailyRecord {
    snapshot.map_or_else(
        || DailyRecord::fresh(today, default_goal_ml),
        |record| roll_over(record.normalized(), today),
    )
}
