//! Local-first synchronization between the on-device store and the remote
//! document store.

pub mod availability;
pub mod deadline;
pub mod engine;
pub mod rollover;

pub use availability::{Availability, AvailabilityState};
pub use deadline::{Bounded, bounded};
pub use engine::{SyncEngine, SyncOptions, SyncStatus, SyncTimeouts};
pub use rollover::{resolve_today, roll_over};
