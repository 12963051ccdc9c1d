//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// Hydro - local-first water intake tracking with remote sync
#[derive(Parser, Debug)]
#[command(name = "hydro")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable machine-readable JSON output.
    #[arg(long, short = 'm', visible_alias = "machine", global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/hydrosync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never contact the remote store
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show today's intake, goal and sync state
    Status(commands::status::StatusArgs),

    /// Log a drink
    Add(commands::intake::AddArgs),

    /// Zero today's intake
    Reset(commands::intake::ResetArgs),

    /// Set today's goal
    Goal(commands::intake::GoalArgs),

    /// Show or change reminder settings
    Reminders(commands::reminders::RemindersArgs),

    /// Per-day totals from the remote store
    History(commands::history::HistoryArgs),

    /// Check whether the remote store is usable
    Probe(commands::status::ProbeArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

impl Commands {
    /// Whether the command reads or mirrors through the remote store.
    #[must_use]
    pub const fn uses_remote(&self) -> bool {
        !matches!(self, Self::Completions(_) | Self::Probe(_))
    }
}
