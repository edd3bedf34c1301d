//! Suite orchestration: run each test in order, aggregate pass/fail.
//!
//! A test-level fault or failure marks that test (and the suite) failed,
//! but never stops the suite: the runner proceeds to the next test with a
//! fresh session and browser.

use std::path::Path;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::core::browser::Browser;
use crate::core::registry::Registry;
use crate::core::session::Session;
use crate::io::suite::Suite;
use crate::io::table::load_test;
use crate::looping::{BreakPolicy, RunStop, TestOutcome, run_test};
use crate::step::CommandResult;

/// One suite entry's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSummary {
    /// Display name from the suite file.
    pub name: String,
    pub outcome: TestOutcome,
    pub elapsed_ms: u64,
}

/// Aggregate result of a suite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOutcome {
    pub title: String,
    pub tests: Vec<TestSummary>,
    pub passed: usize,
    pub failed: usize,
}

impl SuiteOutcome {
    /// A suite fails when any of its tests failed.
    pub fn suite_failed(&self) -> bool {
        self.failed > 0
    }
}

/// Run every test of a suite. Test paths resolve relative to `suite_dir`;
/// each test gets a clone of `session_template` and a fresh browser from
/// the factory.
#[instrument(skip_all, fields(suite = %suite.title))]
pub fn run_suite<F>(
    registry: &Registry,
    suite: &Suite,
    suite_dir: &Path,
    session_template: &Session,
    mut make_browser: F,
    break_policy: BreakPolicy,
    mut on_command: impl FnMut(&str, &CommandResult),
) -> SuiteOutcome
where
    F: FnMut() -> Box<dyn Browser>,
{
    let mut tests = Vec::with_capacity(suite.tests.len());
    let mut passed = 0;
    let mut failed = 0;

    for entry in &suite.tests {
        let start = Instant::now();
        let path = suite_dir.join(&entry.href);
        let outcome = match load_test(&path) {
            Ok(test) => {
                let mut browser = make_browser();
                run_test(
                    registry,
                    &test,
                    session_template.clone(),
                    browser.as_mut(),
                    break_policy,
                    |result| on_command(&entry.name, result),
                )
            }
            Err(err) => {
                // An unreadable or unparsable test fails that test only.
                let message = format!("{err:#}");
                warn!(test = %entry.name, error = %message, "test could not be loaded");
                TestOutcome {
                    title: entry.name.clone(),
                    results: Vec::new(),
                    stop: RunStop::Error { message },
                    failed: true,
                }
            }
        };

        if outcome.failed {
            failed += 1;
        } else {
            passed += 1;
        }
        info!(test = %entry.name, failed = outcome.failed, "test finished");
        tests.push(TestSummary {
            name: entry.name.clone(),
            outcome,
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
    }

    SuiteOutcome {
        title: suite.title.clone(),
        tests,
        passed,
        failed,
    }
}
