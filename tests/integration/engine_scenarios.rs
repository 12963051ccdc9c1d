//! End-to-end behavior of the sync engine over in-memory collaborators.

use std::time::Duration;

use chrono::TimeDelta;
use hydrosync::clock::Clock;
use hydrosync::model::{DEFAULT_GOAL_ML, DailyRecord, IntakeEvent};
use hydrosync::remote::{ErrorInjection, RemoteErrorKind};
use hydrosync::storage::{DAILY_RECORD_KEY, LocalStore};
use hydrosync::sync::{Availability, AvailabilityState, SyncOptions, SyncTimeouts};
use hydrosync::test_utils::fixtures::{available_state, record_with};
use hydrosync::test_utils::{EngineFixture, TestLogger, fixed_day, fixed_instant};

#[tokio::test]
async fn fresh_install_reads_default_record() {
    let log = TestLogger::new("fresh_install_reads_default_record");
    let fx = EngineFixture::new();

    let record = fx.engine.read_today().await;
    log.log_record("today", &record);

    assert_eq!(record, DailyRecord::fresh(fixed_day(), DEFAULT_GOAL_ML));
    assert_eq!(fx.remote.calls().len(), 0);
    log.pass();
}

#[tokio::test]
async fn stale_snapshot_rolls_over_keeping_goal() {
    let log = TestLogger::new("stale_snapshot_rolls_over_keeping_goal");
    let fx = EngineFixture::new();
    let yesterday = fixed_day().days_before(1);
    let stale = record_with(
        yesterday,
        2500,
        &[500, 1000],
        fixed_instant() - TimeDelta::days(1),
    );
    assert!(fx.engine.local().save_record(&stale));

    let record = fx.engine.read_today().await;
    log.log_record("today", &record);

    assert_eq!(record.consumed_ml, 0);
    assert!(record.history.is_empty());
    assert_eq!(record.day_key, fixed_day());
    assert_eq!(record.goal_ml, 2500);
    log.pass();
}

#[tokio::test]
async fn repeated_adds_accumulate_in_call_order_locally_and_remotely() {
    let log = TestLogger::new("repeated_adds_accumulate_in_call_order_locally_and_remotely");
    let fx = EngineFixture::available();

    let mut last = None;
    for _ in 0..3 {
        last = Some(fx.engine.add_intake(250).unwrap());
    }
    let record = last.unwrap();
    log.log_record("after adds", &record);
    assert_eq!(record.consumed_ml, 750);
    assert_eq!(record.history.len(), 3);

    fx.engine.settle().await;
    let remote = fx.remote.day(&fx.user(), fixed_day()).unwrap();
    assert_eq!(remote.consumed_ml, 750);
    assert_eq!(remote.history.len(), 3);
    assert_eq!(fx.remote.call_count("add_intake"), 3);
    assert_eq!(fx.engine.availability(), Availability::Available);
    log.pass();
}

#[tokio::test]
async fn permission_error_on_read_keeps_local_and_stops_remote_calls() {
    let log = TestLogger::new("permission_error_on_read_keeps_local_and_stops_remote_calls");
    let fx = EngineFixture::available();
    let local = record_with(fixed_day(), 2000, &[400], fixed_instant());
    assert!(fx.engine.local().save_record(&local));
    fx.remote.inject_error(ErrorInjection::Operation(
        "fetch_day".into(),
        RemoteErrorKind::PermissionDenied,
    ));

    let record = fx.engine.read_today().await;
    log.log_record("read", &record);
    assert_eq!(record, local);
    assert_eq!(fx.engine.availability(), Availability::Unavailable);

    fx.remote.clear_errors();
    let record = fx.engine.add_intake(100).unwrap();
    fx.engine.settle().await;
    assert_eq!(record.consumed_ml, 500);
    assert_eq!(fx.remote.call_count("add_intake"), 0);
    assert_eq!(fx.engine.availability(), Availability::Unavailable);
    log.pass();
}

#[tokio::test]
async fn successful_probe_enables_mirroring() {
    let fx = EngineFixture::new();
    assert_eq!(fx.engine.availability(), Availability::Untested);

    assert_eq!(fx.engine.probe().await, Availability::Available);
    fx.engine.set_goal(2400).unwrap();
    fx.engine.settle().await;

    assert_eq!(fx.remote.call_count("set_goal"), 1);
    assert_eq!(fx.remote.day(&fx.user(), fixed_day()).unwrap().goal_ml, 2400);
}

#[tokio::test]
async fn writes_made_while_untested_survive_the_first_remote_read() {
    let log = TestLogger::new("writes_made_while_untested_survive_the_first_remote_read");
    let fx = EngineFixture::new();
    fx.engine.set_goal(2500).unwrap();
    fx.engine.add_intake(500).unwrap();
    assert!(fx.remote.calls().is_empty());

    assert_eq!(fx.engine.probe().await, Availability::Available);
    let record = fx.engine.read_today().await;
    log.log_record("read", &record);

    assert_eq!(record.consumed_ml, 500);
    assert_eq!(record.goal_ml, 2500);
    assert_eq!(fx.engine.local().load_record().unwrap(), record);

    fx.engine.settle().await;
    assert_eq!(fx.remote.call_count("put_day"), 1);
    assert_eq!(fx.remote.day(&fx.user(), fixed_day()), Some(record.clone()));

    let again = fx.engine.read_today().await;
    assert_eq!(again, record);
    log.pass();
}

#[tokio::test]
async fn untouched_day_is_not_uploaded() {
    let fx = EngineFixture::available();

    let record = fx.engine.read_today().await;
    fx.engine.settle().await;

    assert_eq!(record, DailyRecord::fresh(fixed_day(), DEFAULT_GOAL_ML));
    assert_eq!(fx.remote.calls(), vec!["fetch_day".to_string()]);
    assert!(fx.remote.day(&fx.user(), fixed_day()).is_none());
}

#[tokio::test]
async fn availability_never_returns_to_untested() {
    let fx = EngineFixture::new();
    fx.remote
        .inject_error(ErrorInjection::All(RemoteErrorKind::Unavailable));

    assert_eq!(fx.engine.probe().await, Availability::Unavailable);
    fx.remote.clear_errors();
    fx.engine.add_intake(100).unwrap();
    let _ = fx.engine.read_today().await;
    fx.engine.settle().await;

    assert_ne!(fx.engine.availability(), Availability::Untested);
    assert!(fx.engine.status().probe_started);
}

#[tokio::test(start_paused = true)]
async fn hung_read_is_abandoned_at_the_bound() {
    let log = TestLogger::new("hung_read_is_abandoned_at_the_bound");
    let options = SyncOptions {
        timeouts: SyncTimeouts {
            read: Duration::from_millis(1500),
            ..SyncTimeouts::default()
        },
        ..SyncOptions::default()
    };
    let fx = EngineFixture::build(available_state(), options);
    let local = record_with(fixed_day(), 2000, &[300], fixed_instant());
    assert!(fx.engine.local().save_record(&local));
    fx.remote.set_hang(true);

    let started = tokio::time::Instant::now();
    let record = fx.engine.read_today().await;
    let elapsed = started.elapsed();
    log.log_actual(&elapsed);

    assert_eq!(record, local);
    assert!(elapsed >= Duration::from_millis(1500));
    assert!(elapsed < Duration::from_millis(1600));
    assert_eq!(fx.engine.availability(), Availability::Unavailable);
    log.pass();
}

#[tokio::test]
async fn missing_index_is_recovered_without_losing_availability() {
    let fx = EngineFixture::available();
    let t0 = fixed_instant();
    let late = IntakeEvent::new(300, t0 + TimeDelta::hours(2));
    let early = IntakeEvent::new(200, t0);
    let mut remote_record = DailyRecord::fresh(fixed_day(), 2000);
    remote_record.history = vec![late.clone(), early.clone()];
    remote_record.recompute();
    fx.remote.insert_day(&fx.user(), &remote_record);
    fx.remote.set_missing_index(true);

    let record = fx.engine.read_today().await;

    assert_eq!(fx.remote.index_fallbacks(), 1);
    assert_eq!(record.history, vec![early, late]);
    assert_eq!(record.consumed_ml, 500);
    assert_eq!(fx.engine.availability(), Availability::Available);
}

#[tokio::test]
async fn local_store_failures_are_never_surfaced() {
    let fx = EngineFixture::new();
    fx.local.fail_writes(true);

    let record = fx.engine.add_intake(250).unwrap();
    assert_eq!(record.consumed_ml, 250);
    assert!(fx.local.raw(DAILY_RECORD_KEY).is_none());

    fx.local.fail_writes(false);
    fx.local.fail_reads(true);
    let record = fx.engine.read_today().await;
    assert_eq!(record, DailyRecord::fresh(fixed_day(), DEFAULT_GOAL_ML));
}

#[tokio::test]
async fn corrupt_snapshot_reads_as_absent() {
    let fx = EngineFixture::new();
    fx.local.set(DAILY_RECORD_KEY, b"{not json").unwrap();

    let record = fx.engine.read_today().await;
    assert_eq!(record, DailyRecord::fresh(fixed_day(), DEFAULT_GOAL_ML));
}

#[tokio::test]
async fn midnight_rollover_on_next_mutation() {
    let fx = EngineFixture::new();
    fx.engine.set_goal(3000).unwrap();
    fx.engine.add_intake(700).unwrap();

    fx.clock.advance(TimeDelta::days(1));
    let record = fx.engine.add_intake(100).unwrap();

    assert_eq!(record.day_key, fx.clock.today());
    assert_ne!(record.day_key, fixed_day());
    assert_eq!(record.consumed_ml, 100);
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.goal_ml, 3000);
}

#[tokio::test]
async fn sign_out_skips_remote_and_keeps_availability() {
    let fx = EngineFixture::available();
    fx.session.sign_out();

    let record = fx.engine.add_intake(200).unwrap();
    fx.engine.settle().await;

    assert_eq!(record.consumed_ml, 200);
    assert!(fx.remote.calls().is_empty());
    assert_eq!(fx.engine.availability(), Availability::Available);
}

#[tokio::test]
async fn session_start_adopts_remote_day() {
    let fx = EngineFixture::available();
    fx.session.sign_out();
    let remote_record = record_with(fixed_day(), 1800, &[250, 250], fixed_instant());
    fx.remote.insert_day(&fx.user(), &remote_record);

    let watcher = fx.engine.watch_sessions();
    fx.session.sign_in(fx.user());

    let mut adopted = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if let Some(record) = fx.engine.local().load_record() {
            adopted = Some(record);
            break;
        }
    }
    watcher.abort();

    let adopted = adopted.expect("session start should reconcile today");
    assert_eq!(adopted.consumed_ml, 500);
    assert_eq!(adopted.goal_ml, 1800);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_never_lose_or_double_count() {
    let fx = EngineFixture::with_availability(available_state());

    let mut handles = Vec::new();
    for i in 1..=20_i64 {
        let engine = fx.engine.clone();
        handles.push(tokio::spawn(async move { engine.add_intake(i * 10) }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    fx.engine.settle().await;

    let expected: u32 = (1..=20).map(|i| i * 10).sum();
    let local = fx.engine.local().load_record().unwrap();
    assert_eq!(local.consumed_ml, expected);
    assert_eq!(local.history.len(), 20);

    let remote = fx.remote.day(&fx.user(), fixed_day()).unwrap();
    assert_eq!(remote.consumed_ml, expected);
    assert_eq!(remote.history.len(), 20);
}

#[tokio::test]
async fn no_remote_configured_behaves_offline() {
    use hydrosync::clock::ManualClock;
    use hydrosync::remote::MockRemoteStore;
    use hydrosync::session::SessionHandle;
    use hydrosync::storage::MemoryStore;
    use hydrosync::sync::SyncEngine;

    let engine: SyncEngine<MemoryStore, MockRemoteStore, SessionHandle, ManualClock> =
        SyncEngine::with_availability(
            MemoryStore::new(),
            None,
            SessionHandle::default(),
            ManualClock::new(fixed_instant()),
            SyncOptions::default(),
            AvailabilityState::new(),
        );

    assert_eq!(engine.probe().await, Availability::Unavailable);
    let record = engine.add_intake(150).unwrap();
    assert_eq!(record.consumed_ml, 150);
    assert!(engine.history(7).await.is_empty());
    assert!(!engine.status().remote_configured);
}
