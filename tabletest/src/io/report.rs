//! JSON run reports.
//!
//! Reports are a stable serialization of run outcomes, written pretty with
//! a trailing newline so they diff cleanly under version control.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::looping::{RunStop, TestOutcome};
use crate::step::CommandResult;
use crate::suite_run::{SuiteOutcome, TestSummary};

/// One test's report entry.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub title: String,
    pub passed: bool,
    /// Why the run stopped, when it did not simply complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped: Option<String>,
    /// Wall-clock duration, when the run was timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    pub commands: Vec<CommandResult>,
}

impl TestReport {
    pub fn from_outcome(outcome: &TestOutcome) -> Self {
        let stopped = match &outcome.stop {
            RunStop::Complete => None,
            RunStop::Paused => Some("paused".to_string()),
            RunStop::Aborted => Some("aborted".to_string()),
            RunStop::Failed { message } => Some(format!("failed: {message}")),
            RunStop::Error { message } => Some(format!("error: {message}")),
        };
        Self {
            title: outcome.title.clone(),
            passed: !outcome.failed,
            stopped,
            elapsed_ms: None,
            commands: outcome.results.clone(),
        }
    }

    pub fn from_summary(summary: &TestSummary) -> Self {
        Self {
            elapsed_ms: Some(summary.elapsed_ms),
            ..Self::from_outcome(&summary.outcome)
        }
    }
}

/// A whole suite's report.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub title: String,
    pub passed: usize,
    pub failed: usize,
    pub tests: Vec<TestReport>,
}

impl SuiteReport {
    pub fn from_outcome(outcome: &SuiteOutcome) -> Self {
        Self {
            title: outcome.title.clone(),
            passed: outcome.passed,
            failed: outcome.failed,
            tests: outcome.tests.iter().map(TestReport::from_summary).collect(),
        }
    }
}

/// Write a report as pretty-printed JSON with a trailing newline, creating
/// parent directories as needed.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(report).context("serialize report")?;
    buf.push('\n');
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
