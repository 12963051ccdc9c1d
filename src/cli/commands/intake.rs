use clap::Args;

use super::{record_json, record_layout};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;
use crate::model::DailyRecord;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Amount in milliliters
    #[arg(allow_negative_numbers = true)]
    pub ml: i64,
}

#[derive(Args, Debug)]
pub struct ResetArgs {}

#[derive(Args, Debug)]
pub struct GoalArgs {
    /// New daily goal in milliliters
    #[arg(allow_negative_numbers = true)]
    pub ml: i64,
}

pub fn add(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    let record = ctx.engine.add_intake(args.ml)?;
    report(ctx, "added", &format!("Added {} ml", args.ml), &record)
}

pub fn reset(ctx: &AppContext, _args: &ResetArgs) -> Result<()> {
    let record = ctx.engine.reset_today();
    report(ctx, "reset", "Today reset", &record)
}

pub fn goal(ctx: &AppContext, args: &GoalArgs) -> Result<()> {
    let record = ctx.engine.set_goal(args.ml)?;
    report(ctx, "goal_set", &format!("Goal set to {} ml", args.ml), &record)
}

fn report(ctx: &AppContext, action: &str, title: &str, record: &DailyRecord) -> Result<()> {
    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "action": action,
            "today": record_json(record),
        }));
    }
    let mut layout = HumanLayout::new();
    layout.title(title);
    record_layout(&mut layout, record);
    emit_human(layout);
    Ok(())
}
