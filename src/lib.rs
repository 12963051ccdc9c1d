pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod reminders;
pub mod remote;
pub mod session;
pub mod storage;
pub mod sync;
pub mod test_utils;

pub use error::{HydroError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
