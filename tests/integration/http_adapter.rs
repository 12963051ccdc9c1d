//! `HttpRemoteStore` against a mock document server.

use std::sync::Arc;

use chrono::TimeDelta;
use httpmock::prelude::*;
use serde_json::json;

use hydrosync::clock::ManualClock;
use hydrosync::model::{DayStats, IntakeEvent, ReminderSettings, UserId};
use hydrosync::remote::{HttpRemoteStore, RemoteErrorKind, RemoteStore};
use hydrosync::session::SessionHandle;
use hydrosync::storage::MemoryStore;
use hydrosync::sync::{Availability, SyncEngine, SyncOptions};
use hydrosync::test_utils::fixtures::record_with;
use hydrosync::test_utils::{fixed_day, fixed_instant};

const DAY_PATH: &str = "/v1/users/user-1/days/2024-03-10";

fn user() -> UserId {
    UserId::new("user-1")
}

fn store(server: &MockServer) -> HttpRemoteStore {
    HttpRemoteStore::new(server.base_url(), Some("key-1".to_string())).unwrap()
}

#[tokio::test]
async fn fetch_day_reads_stats_and_ordered_intakes() {
    let server = MockServer::start_async().await;
    let first = IntakeEvent::new(200, fixed_instant());
    let second = IntakeEvent::new(300, fixed_instant() + TimeDelta::minutes(30));

    let stats = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(DAY_PATH)
                .header("authorization", "Bearer key-1");
            then.status(200)
                .json_body(json!({ "total_ml": 500, "goal_ml": 2500 }));
        })
        .await;
    let intakes = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{DAY_PATH}/intakes"))
                .query_param("order", "occurred_at");
            then.status(200)
                .json_body(json!({ "documents": [first, second] }));
        })
        .await;

    let record = store(&server)
        .fetch_day(&user(), fixed_day())
        .await
        .unwrap()
        .unwrap();

    stats.assert_async().await;
    intakes.assert_async().await;
    assert_eq!(record.consumed_ml, 500);
    assert_eq!(record.goal_ml, 2500);
    assert_eq!(record.history, vec![first, second]);
}

#[tokio::test]
async fn fetch_day_without_stats_document_is_absent() {
    let server = MockServer::start_async().await;
    let stats = server
        .mock_async(|when, then| {
            when.method(GET).path(DAY_PATH);
            then.status(404);
        })
        .await;
    let intakes = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{DAY_PATH}/intakes"));
            then.status(200).json_body(json!({ "documents": [] }));
        })
        .await;

    let record = store(&server).fetch_day(&user(), fixed_day()).await.unwrap();

    assert_eq!(record, None);
    stats.assert_async().await;
    assert_eq!(intakes.hits_async().await, 0);
}

#[tokio::test]
async fn fetch_day_sorts_in_memory_when_index_is_missing() {
    let server = MockServer::start_async().await;
    let early = IntakeEvent::new(100, fixed_instant());
    let late = IntakeEvent::new(150, fixed_instant() + TimeDelta::hours(1));

    server
        .mock_async(|when, then| {
            when.method(GET).path(DAY_PATH);
            then.status(200)
                .json_body(json!({ "total_ml": 250, "goal_ml": 2000 }));
        })
        .await;
    let ordered = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{DAY_PATH}/intakes"))
                .query_param("order", "occurred_at");
            then.status(412)
                .json_body(json!({ "error": "FAILED_PRECONDITION: index required" }));
        })
        .await;
    let unordered = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("{DAY_PATH}/intakes"))
                .query_param_missing("order");
            then.status(200)
                .json_body(json!({ "documents": [late, early] }));
        })
        .await;

    let record = store(&server)
        .fetch_day(&user(), fixed_day())
        .await
        .unwrap()
        .unwrap();

    ordered.assert_async().await;
    unordered.assert_async().await;
    assert_eq!(record.history, vec![early, late]);
}

#[tokio::test]
async fn add_intake_puts_event_then_increments_counter() {
    let server = MockServer::start_async().await;
    let event = IntakeEvent::new(250, fixed_instant());

    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("{DAY_PATH}/intakes/{}", event.id))
                .json_body(serde_json::to_value(&event).unwrap());
            then.status(200);
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(DAY_PATH)
                .json_body(json!({ "increment_ml": 250, "goal_ml": 2000 }));
            then.status(200);
        })
        .await;

    store(&server)
        .add_intake(&user(), fixed_day(), &event, 2000)
        .await
        .unwrap();

    put.assert_async().await;
    patch.assert_async().await;
}

#[tokio::test]
async fn put_day_uploads_intakes_then_sets_totals() {
    let server = MockServer::start_async().await;
    let record = record_with(fixed_day(), 2500, &[300, 200], fixed_instant());

    let mut puts = Vec::new();
    for event in &record.history {
        puts.push(
            server
                .mock_async(|when, then| {
                    when.method(PUT)
                        .path(format!("{DAY_PATH}/intakes/{}", event.id))
                        .json_body(serde_json::to_value(event).unwrap());
                    then.status(200);
                })
                .await,
        );
    }
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(DAY_PATH)
                .json_body(json!({ "total_ml": 500, "goal_ml": 2500 }));
            then.status(200);
        })
        .await;

    store(&server).put_day(&user(), &record).await.unwrap();

    for put in puts {
        put.assert_async().await;
    }
    patch.assert_async().await;
}

#[tokio::test]
async fn reset_deletes_intakes_and_zeroes_stats() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{DAY_PATH}/intakes"));
            then.status(204);
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(DAY_PATH)
                .json_body(json!({ "total_ml": 0, "goal_ml": 2500 }));
            then.status(200);
        })
        .await;

    store(&server)
        .reset_day(&user(), fixed_day(), 2500)
        .await
        .unwrap();

    delete.assert_async().await;
    patch.assert_async().await;
}

#[tokio::test]
async fn set_goal_patches_only_the_goal() {
    let server = MockServer::start_async().await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(DAY_PATH)
                .json_body(json!({ "goal_ml": 3000 }));
            then.status(200);
        })
        .await;

    store(&server)
        .set_goal(&user(), fixed_day(), 3000)
        .await
        .unwrap();
    patch.assert_async().await;
}

#[tokio::test]
async fn settings_default_when_absent_and_merge_on_save() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/users/user-1/settings/reminders");
            then.status(404);
        })
        .await;
    let settings = ReminderSettings {
        interval_minutes: 90,
        ..ReminderSettings::default()
    };
    let save = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/v1/users/user-1/settings/reminders")
                .json_body(serde_json::to_value(&settings).unwrap());
            then.status(200);
        })
        .await;

    let remote = store(&server);
    assert_eq!(
        remote.load_settings(&user()).await.unwrap(),
        ReminderSettings::default()
    );
    remote.save_settings(&user(), &settings).await.unwrap();
    save.assert_async().await;
}

#[tokio::test]
async fn day_stats_are_newest_first_even_without_index() {
    let server = MockServer::start_async().await;
    let since = fixed_day().days_before(2);
    let oldest = DayStats {
        day_key: since,
        total_ml: 1000,
        goal_ml: 2000,
    };
    let newest = DayStats {
        day_key: fixed_day(),
        total_ml: 500,
        goal_ml: 2000,
    };

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/users/user-1/days")
                .query_param("order", "desc");
            then.status(412);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/users/user-1/days")
                .query_param("since", since.to_string())
                .query_param_missing("order");
            then.status(200)
                .json_body(json!({ "documents": [oldest, newest] }));
        })
        .await;

    let stats = store(&server).day_stats(&user(), since).await.unwrap();
    assert_eq!(stats, vec![newest, oldest]);
}

#[tokio::test]
async fn status_codes_map_to_error_kinds() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DAY_PATH);
            then.status(403);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/users/user-1/settings/reminders");
            then.status(401);
        })
        .await;

    let remote = store(&server);
    let err = remote.fetch_day(&user(), fixed_day()).await.unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::PermissionDenied);
    assert!(err.is_permission());

    let err = remote.load_settings(&user()).await.unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Unauthenticated);
}

#[tokio::test]
async fn garbage_body_is_an_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DAY_PATH);
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let err = store(&server)
        .fetch_day(&user(), fixed_day())
        .await
        .unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::InvalidResponse);
    assert!(!err.marks_unavailable());
}

#[tokio::test]
async fn project_scoped_paths() {
    let server = MockServer::start_async().await;
    let stats = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/projects/demo/users/user-1/days/2024-03-10");
            then.status(404);
        })
        .await;

    let remote = store(&server).with_project(Some("demo".to_string()));
    remote.fetch_day(&user(), fixed_day()).await.unwrap();
    stats.assert_async().await;
}

#[tokio::test]
async fn connection_refused_is_unreachable() {
    let remote = HttpRemoteStore::new("http://127.0.0.1:9", None).unwrap();
    let err = remote.fetch_day(&user(), fixed_day()).await.unwrap_err();
    assert!(err.is_unreachable(), "unexpected error kind {}", err.kind);
}

#[tokio::test]
async fn engine_mirrors_writes_over_http() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method(GET).path(DAY_PATH);
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
                .path(DAY_PATH)
                .json_body(json!({ "increment_ml": 400, "goal_ml": 2000 }));
            then.status(200);
        })
        .await;

    let engine = SyncEngine::new(
        MemoryStore::new(),
        Some(store(&server)),
        SessionHandle::signed_in(user()),
        Arc::new(ManualClock::new(fixed_instant())),
        SyncOptions::default(),
    );

    assert_eq!(engine.probe().await, Availability::Available);
    let record = engine.add_intake(400).unwrap();
    assert_eq!(record.consumed_ml, 400);
    engine.settle().await;

    probe.assert_async().await;
    put.assert_async().await;
    patch.assert_async().await;
    assert_eq!(engine.availability(), Availability::Available);
}
