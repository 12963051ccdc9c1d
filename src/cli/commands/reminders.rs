use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;
use crate::model::{ReminderSettings, TimeOfDay};
use crate::reminders::{self, ReminderPlan, TracingSink};

#[derive(Args, Debug)]
pub struct RemindersArgs {
    #[command(subcommand)]
    pub command: RemindersCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemindersCommand {
    /// Show current reminder settings
    Show,
    /// Change reminder settings and reschedule
    Set(SetArgs),
    /// Show the alerts the current settings produce
    Plan,
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Turn reminders on
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Turn reminders off
    #[arg(long)]
    pub disable: bool,

    /// Minutes between reminders
    #[arg(long)]
    pub interval: Option<u32>,

    /// Window start (HH:MM)
    #[arg(long)]
    pub start: Option<TimeOfDay>,

    /// Window end (HH:MM)
    #[arg(long)]
    pub end: Option<TimeOfDay>,

    /// Suggested amount per reminder in milliliters
    #[arg(long)]
    pub amount: Option<u32>,
}

impl SetArgs {
    /// Overlay the given flags on `current`.
    #[must_use]
    pub fn apply(&self, mut current: ReminderSettings) -> ReminderSettings {
        if self.enable {
            current.enabled = true;
        }
        if self.disable {
            current.enabled = false;
        }
        if let Some(interval) = self.interval {
            current.interval_minutes = interval;
        }
        if let Some(start) = self.start {
            current.window_start = start;
        }
        if let Some(end) = self.end {
            current.window_end = end;
        }
        if let Some(amount) = self.amount {
            current.amount_ml = amount;
        }
        current
    }
}

pub async fn run(ctx: &AppContext, args: &RemindersArgs) -> Result<()> {
    match &args.command {
        RemindersCommand::Show => show(ctx).await,
        RemindersCommand::Set(args) => set(ctx, args).await,
        RemindersCommand::Plan => plan(ctx).await,
    }
}

async fn show(ctx: &AppContext) -> Result<()> {
    let settings = ctx.engine.read_reminder_settings().await;
    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "settings": settings,
        }));
    }
    let mut layout = HumanLayout::new();
    layout.title("Reminders");
    settings_layout(&mut layout, &settings);
    emit_human(layout);
    Ok(())
}

async fn set(ctx: &AppContext, args: &SetArgs) -> Result<()> {
    let current = ctx.engine.read_reminder_settings().await;
    let settings = args.apply(current);
    ctx.engine.save_reminder_settings(&settings)?;
    let plan = reminders::arrange(&mut TracingSink, &settings)?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "settings": settings,
            "plan": plan,
        }));
    }
    let mut layout = HumanLayout::new();
    layout.title("Reminders updated");
    settings_layout(&mut layout, &settings);
    layout.blank();
    plan_layout(&mut layout, &plan);
    emit_human(layout);
    Ok(())
}

async fn plan(ctx: &AppContext) -> Result<()> {
    let settings = ctx.engine.read_reminder_settings().await;
    let plan = reminders::plan(&settings)?;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "plan": plan,
        }));
    }
    let mut layout = HumanLayout::new();
    plan_layout(&mut layout, &plan);
    emit_human(layout);
    Ok(())
}

fn settings_layout(layout: &mut HumanLayout, settings: &ReminderSettings) {
    layout
        .kv("Enabled", if settings.enabled { "yes" } else { "no" })
        .kv("Interval", &format!("{} min", settings.interval_minutes))
        .kv(
            "Window",
            &format!("{} - {}", settings.window_start, settings.window_end),
        )
        .kv("Amount", &format!("{} ml", settings.amount_ml));
}

fn plan_layout(layout: &mut HumanLayout, plan: &ReminderPlan) {
    match plan {
        ReminderPlan::CancelAll => {
            layout.section("Schedule").push_line("Reminders are off.");
        }
        ReminderPlan::Schedule { slots } => {
            layout.section(&format!("Schedule ({} daily alerts)", slots.len()));
            for slot in slots {
                layout.bullet(&format!("{}  {}", slot.at, slot.body()));
            }
        }
    }
}
