use clap::Args;

use super::{record_json, record_layout};
use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// List today's individual entries
    #[arg(long)]
    pub entries: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {}

pub async fn run(ctx: &AppContext, args: &StatusArgs) -> Result<()> {
    let record = ctx.engine.read_today().await;
    let sync = ctx.engine.status();

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "today": record_json(&record),
            "sync": sync,
        }));
    }

    let mut layout = HumanLayout::new();
    layout.title("Today");
    record_layout(&mut layout, &record);
    layout
        .blank()
        .section("Sync")
        .kv("Remote", if sync.remote_configured { "configured" } else { "off" })
        .kv("Availability", sync.availability.as_str())
        .kv(
            "User",
            sync.user.as_ref().map_or("(signed out)", |user| user.as_str()),
        );

    if args.entries {
        layout.blank().section("Entries");
        if record.history.is_empty() {
            layout.push_line("(none)");
        }
        for entry in &record.history {
            layout.bullet(&format!(
                "{} {} ml",
                entry.occurred_at.format("%H:%M"),
                entry.amount_ml
            ));
        }
    }
    emit_human(layout);
    Ok(())
}

pub async fn probe(ctx: &AppContext, _args: &ProbeArgs) -> Result<()> {
    let availability = ctx.engine.probe().await;

    if ctx.robot_mode {
        return emit_json(&serde_json::json!({
            "status": "ok",
            "availability": availability,
            "remote_configured": ctx.engine.remote().is_some(),
        }));
    }
    let mut layout = HumanLayout::new();
    layout
        .title("Remote Probe")
        .kv("Availability", availability.as_str());
    emit_human(layout);
    Ok(())
}
