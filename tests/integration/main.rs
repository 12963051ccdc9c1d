//! Integration test suite entry point.

mod command_flow;
mod engine_scenarios;
mod http_adapter;
