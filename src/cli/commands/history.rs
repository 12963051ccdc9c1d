use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, progress_bar};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of days back, today included
    #[arg(long, default_value_t = 7)]
    pub days: u32,
}

pub async fn run(ctx: &AppContext, args: &HistoryArgs) -> Result<()> {
    let stats = ctx.engine.history(args.days).await;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "days": args.days,
            "availability": ctx.engine.availability(),
            "stats": stats,
        }));
    }

    let mut layout = HumanLayout::new();
    layout.title(&format!("Last {} days", args.days));
    if stats.is_empty() {
        layout.push_line("No remote history available.");
    }
    for day in &stats {
        let fraction = if day.goal_ml == 0 {
            0.0
        } else {
            f64::from(day.total_ml) / f64::from(day.goal_ml)
        };
        layout.kv(
            &day.day_key.to_string(),
            &format!(
                "{:>5} / {} ml {}",
                day.total_ml,
                day.goal_ml,
                progress_bar(fraction, 10)
            ),
        );
    }
    emit_human(layout);
    Ok(())
}
