//! Property test suite entry point.

mod reminder_properties;
mod sync_properties;
