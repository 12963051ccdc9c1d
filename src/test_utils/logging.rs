use std::time::Instant;

use crate::model::DailyRecord;

/// Route `tracing` output through the test harness writer. Safe to call
/// from every test; only the first call installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hydrosync=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub struct TestLogger {
    test_name: String,
    start_time: Instant,
}

impl TestLogger {
    pub fn new(test_name: &str) -> Self {
        init_test_tracing();
        let separator = "=".repeat(60);
        println!("\n{separator}");
        println!("[TEST START] {test_name}");
        println!("{separator}");
        Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn step(&self, what: &str) {
        println!("[STEP +{:?}] {what}", self.start_time.elapsed());
    }

    pub fn log_record(&self, label: &str, record: &DailyRecord) {
        println!(
            "[RECORD] {label}: day={} consumed={}ml goal={}ml entries={}",
            record.day_key,
            record.consumed_ml,
            record.goal_ml,
            record.history.len()
        );
    }

    pub fn log_actual<T: std::fmt::Debug>(&self, value: &T) {
        println!("[ACTUAL] {value:?}");
    }

    pub fn pass(&self) {
        let elapsed = self.start_time.elapsed();
        println!("[RESULT] {} PASSED in {elapsed:?}", self.test_name);
        println!("{}\n", "=".repeat(60));
    }
}
