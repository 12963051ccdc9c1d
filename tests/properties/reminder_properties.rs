//! Property-based tests for reminder planning.

use proptest::prelude::*;

use hydrosync::model::{ReminderSettings, TimeOfDay};
use hydrosync::reminders::{RecordingSink, ReminderPlan, arrange, plan};

fn arb_settings() -> impl Strategy<Value = ReminderSettings> {
    (0_u32..1439, 1_u32..1440, 1_u32..600, 1_u32..2_000).prop_map(
        |(start, span, interval, amount)| {
            let end = (start + span).min(1439).max(start + 1);
            ReminderSettings {
                enabled: true,
                interval_minutes: interval,
                window_start: TimeOfDay::from_minutes(start).unwrap(),
                window_end: TimeOfDay::from_minutes(end).unwrap(),
                amount_ml: amount,
            }
        },
    )
}

proptest! {
    #[test]
    fn slots_stay_inside_the_window(settings in arb_settings()) {
        let plan = plan(&settings).unwrap();
        let slots = plan.slots();
        let start = settings.window_start.minutes();
        let end = settings.window_end.minutes();

        prop_assert!(!slots.is_empty());
        prop_assert_eq!(slots[0].at, settings.window_start);
        for slot in slots {
            prop_assert!(slot.at.minutes() >= start);
            prop_assert!(slot.at.minutes() < end);
            prop_assert_eq!(slot.amount_ml, settings.amount_ml);
        }
        for pair in slots.windows(2) {
            prop_assert_eq!(pair[1].at.minutes() - pair[0].at.minutes(), settings.interval_minutes);
        }
        let expected = (end - start).div_ceil(settings.interval_minutes) as usize;
        prop_assert_eq!(slots.len(), expected);
    }

    #[test]
    fn disabled_always_cancels(mut settings in arb_settings()) {
        settings.enabled = false;
        prop_assert_eq!(plan(&settings).unwrap(), ReminderPlan::CancelAll);
    }

    #[test]
    fn rearranging_never_stacks_alerts(first in arb_settings(), second in arb_settings()) {
        let mut sink = RecordingSink::default();
        arrange(&mut sink, &first).unwrap();
        let expected = arrange(&mut sink, &second).unwrap();
        prop_assert_eq!(sink.active(), expected.slots().to_vec());
    }
}
