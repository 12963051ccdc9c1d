//! Daily hydration reminders.
//!
//! [`plan`] turns settings into the set of recurring daily alerts; an
//! [`AlertSink`] is whatever actually delivers them. [`arrange`] always
//! clears the sink before scheduling, so re-arranging never stacks alerts.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::{ReminderSettings, TimeOfDay};

pub const CHANNEL_ID: &str = "water-reminders";
pub const ALERT_TITLE: &str = "Time to Hydrate!";

/// One recurring daily alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSlot {
    pub at: TimeOfDay,
    pub amount_ml: u32,
}

impl ReminderSlot {
    #[must_use]
    pub const fn title(&self) -> &'static str {
        ALERT_TITLE
    }

    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "Remember to drink {}ml of water. Stay healthy!",
            self.amount_ml
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReminderPlan {
    CancelAll,
    Schedule { slots: Vec<ReminderSlot> },
}

impl ReminderPlan {
    #[must_use]
    pub fn slots(&self) -> &[ReminderSlot] {
        match self {
            Self::CancelAll => &[],
            Self::Schedule { slots } => slots,
        }
    }
}

/// Slices of `[window_start, window_end)` every `interval_minutes`,
/// starting at `window_start`.
pub fn plan(settings: &ReminderSettings) -> Result<ReminderPlan> {
    if !settings.enabled {
        return Ok(ReminderPlan::CancelAll);
    }
    settings.validate()?;

    let start = settings.window_start.minutes();
    let end = settings.window_end.minutes();
    let step = usize::try_from(settings.interval_minutes).unwrap_or(usize::MAX);
    let slots = (start..end)
        .step_by(step)
        .filter_map(TimeOfDay::from_minutes)
        .map(|at| ReminderSlot {
            at,
            amount_ml: settings.amount_ml,
        })
        .collect();
    Ok(ReminderPlan::Schedule { slots })
}

/// Delivery side of reminders.
pub trait AlertSink {
    fn cancel_all(&mut self) -> Result<()>;

    fn schedule_daily(&mut self, slot: &ReminderSlot) -> Result<()>;
}

/// Cancel everything, then schedule what the settings call for.
pub fn arrange<A: AlertSink + ?Sized>(
    sink: &mut A,
    settings: &ReminderSettings,
) -> Result<ReminderPlan> {
    let plan = plan(settings)?;
    sink.cancel_all()?;
    for slot in plan.slots() {
        sink.schedule_daily(slot)?;
    }
    info!(
        enabled = settings.enabled,
        alerts = plan.slots().len(),
        "reminders arranged"
    );
    Ok(plan)
}

/// Sink that only logs, for hosts without a notification service.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn cancel_all(&mut self) -> Result<()> {
        info!(channel = CHANNEL_ID, "cancel all reminders");
        Ok(())
    }

    fn schedule_daily(&mut self, slot: &ReminderSlot) -> Result<()> {
        info!(
            channel = CHANNEL_ID,
            at = %slot.at,
            title = slot.title(),
            body = %slot.body(),
            "schedule daily reminder"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    CancelAll,
    Schedule(ReminderSlot),
}

/// Sink that remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub ops: Vec<SinkOp>,
}

impl RecordingSink {
    /// Alerts that would be live after the recorded ops.
    #[must_use]
    pub fn active(&self) -> Vec<ReminderSlot> {
        let mut active = Vec::new();
        for op in &self.ops {
            match op {
                SinkOp::CancelAll => active.clear(),
                SinkOp::Schedule(slot) => active.push(slot.clone()),
            }
        }
        active
    }
}

impl AlertSink for RecordingSink {
    fn cancel_all(&mut self) -> Result<()> {
        self.ops.push(SinkOp::CancelAll);
        Ok(())
    }

    fn schedule_daily(&mut self, slot: &ReminderSlot) -> Result<()> {
        self.ops.push(SinkOp::Schedule(slot.clone()));
        Ok(())
    }
}
