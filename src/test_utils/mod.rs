//! Shared test utilities for hydrosync.

pub mod fixtures;
pub mod logging;

pub use fixtures::{DataDirFixture, EngineFixture, FixtureEngine, fixed_day, fixed_instant};
pub use logging::{TestLogger, init_test_tracing};

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

/// Run table-driven tests, logging each case.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F)
where
    I: std::fmt::Debug + Clone,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E,
{
    for case in cases {
        let start = std::time::Instant::now();
        println!("[TEST] Running: {} input={:?}", case.name, case.input);

        let actual = test_fn(case.input.clone());
        println!("[TEST] Expected: {:?} Actual: {actual:?}", case.expected);

        assert_eq!(actual, case.expected, "Test '{}' failed", case.name);
        println!("[TEST] PASSED: {} ({:?})", case.name, start.elapsed());
    }
}
