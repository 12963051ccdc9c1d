//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use tracing::debug;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::cli::output::{HumanLayout, progress_bar};
use crate::error::{HydroError, Result};
use crate::model::DailyRecord;

pub mod completions;
pub mod history;
pub mod intake;
pub mod reminders;
pub mod status;

/// Settle remote availability, run the command, then wait for its mirrors.
pub async fn execute(ctx: &AppContext, command: &Commands) -> Result<()> {
    if command.uses_remote() {
        let availability = ctx.engine.probe().await;
        debug!(%availability, "remote probed");
    }
    let outcome = run(ctx, command).await;
    ctx.engine.settle().await;
    outcome
}

/// Dispatch a command to its handler
pub async fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Status(args) => status::run(ctx, args).await,
        Commands::Add(args) => intake::add(ctx, args),
        Commands::Reset(args) => intake::reset(ctx, args),
        Commands::Goal(args) => intake::goal(ctx, args),
        Commands::Reminders(args) => reminders::run(ctx, args).await,
        Commands::History(args) => history::run(ctx, args).await,
        Commands::Probe(args) => status::probe(ctx, args).await,
        Commands::Completions(_) => Err(HydroError::Internal(
            "completions are generated without a context".to_string(),
        )),
    }
}

/// Shared human rendering of a day record.
pub(crate) fn record_layout(layout: &mut HumanLayout, record: &DailyRecord) {
    layout
        .kv("Day", &record.day_key.to_string())
        .kv("Consumed", &format!("{} ml", record.consumed_ml))
        .kv("Goal", &format!("{} ml", record.goal_ml))
        .kv("Remaining", &format!("{} ml", record.remaining_ml()))
        .kv("Progress", &progress_bar(record.progress(), 20));
}

pub(crate) fn record_json(record: &DailyRecord) -> serde_json::Value {
    serde_json::json!({
        "day_key": record.day_key,
        "consumed_ml": record.consumed_ml,
        "goal_ml": record.goal_ml,
        "remaining_ml": record.remaining_ml(),
        "progress": record.progress(),
        "entries": record.history,
    })
}
