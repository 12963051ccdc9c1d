//! Whole `hydro` invocations against a document server: one context, one
//! command, the way `main` drives them.

use chrono::Utc;
use clap::Parser;
use httpmock::prelude::*;
use serde_json::json;

use hydrosync::app::AppContext;
use hydrosync::cli::Cli;
use hydrosync::cli::commands::execute;
use hydrosync::clock::{Clock, SystemClock};
use hydrosync::config::Config;
use hydrosync::model::{DayStats, IntakeEvent};
use hydrosync::sync::Availability;
use hydrosync::test_utils::{DataDirFixture, TestLogger};

const USER: &str = "cli-user";

fn remote_config(fixture: &DataDirFixture, server: &MockServer) -> Config {
    let mut config = fixture.config();
    config.remote.enabled = true;
    config.remote.base_url = Some(server.base_url());
    config.session.user_id = Some(USER.to_string());
    config
}

fn day_path() -> String {
    format!("/v1/users/{USER}/days/{}", SystemClock.today())
}

async fn hydro(ctx: &AppContext, args: &[&str]) {
    let cli = Cli::parse_from(std::iter::once("hydro").chain(args.iter().copied()));
    execute(ctx, &cli.command).await.unwrap();
}

#[tokio::test]
async fn add_is_mirrored_in_the_same_invocation() {
    let log = TestLogger::new("add_is_mirrored_in_the_same_invocation");
    let server = MockServer::start_async().await;
    let stats = server
        .mock_async(|when, then| {
            when.method(GET).path(day_path());
            then.status(404);
        })
        .await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT);
            then.status(200);
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(day_path())
                .json_body(json!({ "increment_ml": 250, "goal_ml": 2000 }));
            then.status(200);
        })
        .await;

    let fixture = DataDirFixture::new();
    let ctx = AppContext::build(remote_config(&fixture, &server), true, false).unwrap();
    hydro(&ctx, &["--robot", "add", "250"]).await;

    stats.assert_async().await;
    put.assert_async().await;
    patch.assert_async().await;
    assert_eq!(ctx.engine.availability(), Availability::Available);
    log.pass();
}

#[tokio::test]
async fn history_reads_the_remote_in_the_same_invocation() {
    let server = MockServer::start_async().await;
    let today = SystemClock.today();
    let stats = DayStats {
        day_key: today,
        total_ml: 1250,
        goal_ml: 2000,
    };
    server
        .mock_async(|when, then| {
            when.method(GET).path(day_path());
            then.status(404);
        })
        .await;
    let days = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/v1/users/{USER}/days"))
                .query_param("order", "desc");
            then.status(200).json_body(json!({ "documents": [stats] }));
        })
        .await;

    let fixture = DataDirFixture::new();
    let ctx = AppContext::build(remote_config(&fixture, &server), true, false).unwrap();
    hydro(&ctx, &["--robot", "history", "--days", "3"]).await;

    assert_eq!(days.hits_async().await, 1);
    assert_eq!(ctx.engine.history(3).await, vec![stats]);
}

#[tokio::test]
async fn status_adopts_the_remote_day() {
    let server = MockServer::start_async().await;
    let event = IntakeEvent::new(300, Utc::now());
    server
        .mock_async(|when, then| {
            when.method(GET).path(day_path());
            then.status(200)
                .json_body(json!({ "total_ml": 300, "goal_ml": 2200 }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{}/intakes", day_path()))
                .query_param("order", "occurred_at");
            then.status(200).json_body(json!({ "documents": [event] }));
        })
        .await;

    let fixture = DataDirFixture::new();
    let ctx = AppContext::build(remote_config(&fixture, &server), true, false).unwrap();
    hydro(&ctx, &["--robot", "status"]).await;

    let local = ctx.engine.local().load_record().unwrap();
    assert_eq!(local.consumed_ml, 300);
    assert_eq!(local.goal_ml, 2200);
    assert_eq!(local.history, vec![event]);
}

#[tokio::test]
async fn unreachable_remote_leaves_the_command_local() {
    let fixture = DataDirFixture::new();
    let mut config = fixture.config();
    config.remote.enabled = true;
    config.remote.base_url = Some("http://127.0.0.1:9".to_string());
    config.session.user_id = Some(USER.to_string());

    let ctx = AppContext::build(config, true, false).unwrap();
    hydro(&ctx, &["--robot", "add", "400"]).await;

    assert_eq!(ctx.engine.availability(), Availability::Unavailable);
    assert_eq!(ctx.engine.local().load_record().unwrap().consumed_ml, 400);
}
