//! Property-based tests for the local phase of the sync engine.

use chrono::{NaiveDate, TimeDelta};
use proptest::prelude::*;

use hydrosync::clock::ManualClock;
use hydrosync::model::{DailyRecord, DayKey, IntakeEvent};
use hydrosync::remote::MockRemoteStore;
use hydrosync::session::SessionHandle;
use hydrosync::storage::MemoryStore;
use hydrosync::sync::{SyncEngine, SyncOptions, roll_over};
use hydrosync::test_utils::fixed_instant;

type LocalEngine = SyncEngine<MemoryStore, MockRemoteStore, SessionHandle, ManualClock>;

fn local_engine() -> LocalEngine {
    SyncEngine::new(
        MemoryStore::new(),
        None,
        SessionHandle::anonymous(),
        ManualClock::new(fixed_instant()),
        SyncOptions::default(),
    )
}

fn arb_day() -> impl Strategy<Value = DayKey> {
    (0_u64..3650).prop_map(|offset| {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        DayKey::from_date(base + chrono::Days::new(offset))
    })
}

fn arb_record() -> impl Strategy<Value = DailyRecord> {
    (
        arb_day(),
        1_u32..10_000,
        prop::collection::vec(1_u32..2_000, 0..12),
    )
        .prop_map(|(day, goal, amounts)| {
            let mut record = DailyRecord::fresh(day, goal);
            for (i, amount) in amounts.into_iter().enumerate() {
                let at = fixed_instant() + TimeDelta::minutes(i as i64);
                record.record_intake(IntakeEvent::new(amount, at));
            }
            record
        })
}

proptest! {
    #[test]
    fn adds_are_counted_exactly_once(amounts in prop::collection::vec(1_i64..5_000, 1..40)) {
        let engine = local_engine();
        let mut last = None;
        for amount in &amounts {
            last = Some(engine.add_intake(*amount).unwrap());
        }
        let record = last.unwrap();
        let expected: i64 = amounts.iter().sum();

        prop_assert_eq!(i64::from(record.consumed_ml), expected);
        prop_assert_eq!(record.history.len(), amounts.len());
        let recorded: Vec<i64> = record.history.iter().map(|e| i64::from(e.amount_ml)).collect();
        prop_assert_eq!(recorded, amounts);
        prop_assert_eq!(engine.local().load_record(), Some(record));
    }

    #[test]
    fn non_positive_amounts_never_touch_the_store(amount in -10_000_i64..=0) {
        let engine = local_engine();
        prop_assert!(engine.add_intake(amount).is_err());
        prop_assert!(engine.set_goal(amount).is_err());
        prop_assert_eq!(engine.local().inner().write_count(), 0);
        prop_assert_eq!(engine.local().inner().read_count(), 0);
    }

    #[test]
    fn rollover_is_idempotent(record in arb_record(), today in arb_day()) {
        let once = roll_over(record.clone(), today);
        let twice = roll_over(once.clone(), today);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.day_key, today);
        prop_assert_eq!(once.goal_ml, record.goal_ml);
        if record.day_key == today {
            prop_assert_eq!(once, record);
        } else {
            prop_assert_eq!(once.consumed_ml, 0);
            prop_assert!(once.history.is_empty());
        }
    }

    #[test]
    fn consumed_always_matches_history(record in arb_record()) {
        let sum: u32 = record.history.iter().map(|e| e.amount_ml).sum();
        prop_assert_eq!(record.consumed_ml, sum);
        let normalized = record.clone().normalized();
        prop_assert_eq!(normalized.consumed_ml, sum);
    }
}
