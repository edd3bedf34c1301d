//! Execution of a single selected command: delay, substitution, dispatch,
//! and condition polling.
//!
//! All waiting here is bounded: condition polls run at a fixed interval
//! against the session's timeout, and expiry is a hard
//! [`WaitTimeoutError`] rather than an open-ended retry.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::browser::Browser;
use crate::core::command::Command;
use crate::core::registry::{CommandOutcome, Condition, Registry, evaluate_check, execute};
use crate::core::session::Session;
use crate::core::substitute::substitute;

/// Fixed polling interval for termination conditions.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A condition poll exhausted the session timeout.
#[derive(Debug)]
pub struct WaitTimeoutError {
    pub timeout: Duration,
    pub elapsed: Duration,
}

impl fmt::Display for WaitTimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timed out after {}ms waiting on condition (timeout {}ms)",
            self.elapsed.as_millis(),
            self.timeout.as_millis()
        )
    }
}

impl std::error::Error for WaitTimeoutError {}

/// Per-command result status as recorded in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Passed,
    Failed,
    Error,
}

/// Outcome of one executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub command: Command,
    pub status: CommandStatus,
    /// Failure or fault message, when any.
    pub message: Option<String>,
    /// Accessor result, when the command produced one.
    pub value: Option<String>,
}

/// Result of one loop iteration: the recorded command result plus the
/// halting policy for failures.
#[derive(Debug)]
pub struct StepOutcome {
    pub result: CommandResult,
    pub halt: bool,
}

/// Execute one command end to end: apply the inter-command delay,
/// substitute `${}`/`javascript{}` in its arguments, dispatch the handler,
/// and poll any termination condition it left behind.
///
/// Faults (unknown command, wait timeout, handler error) come back as
/// `Err` and are folded into the run at the loop boundary; assertion
/// failures are ordinary results carrying their halt policy.
#[instrument(skip_all, fields(command = %command.name))]
pub fn run_command(
    registry: &Registry,
    session: &mut Session,
    browser: &mut dyn Browser,
    command: &Command,
) -> Result<StepOutcome> {
    apply_delay(session);

    // Fail fast on unknown names before substitution can side-effect
    // (script evaluation happens in the page).
    let handler = registry.lookup(&command.name)?;

    let target = substitute(session, browser, &command.target)?;
    let value = substitute(session, browser, &command.value)?;
    debug!(target = %target, value = %value, "dispatching");

    let dispatched = execute(handler, session, browser, &target, &value)?;

    if let Some(condition) = dispatched.condition {
        await_condition(&condition, session, browser)?;
    }

    let (status, message, result_value, halt) = match dispatched.outcome {
        CommandOutcome::Ok => (CommandStatus::Passed, None, None, false),
        CommandOutcome::OkValue(v) => (CommandStatus::Passed, None, Some(v), false),
        CommandOutcome::Failed { message, halt } => {
            (CommandStatus::Failed, Some(message), None, halt)
        }
    };

    Ok(StepOutcome {
        result: CommandResult {
            command: command.clone(),
            status,
            message,
            value: result_value,
        },
        halt,
    })
}

fn apply_delay(session: &mut Session) {
    if let Some(pause) = session.take_pause_once() {
        thread::sleep(pause);
    } else if session.speed_ms() > 0 {
        thread::sleep(Duration::from_millis(session.speed_ms() as u64));
    }
}

/// Poll a termination condition every [`POLL_INTERVAL`] until it holds or
/// the session timeout expires. A predicate error counts as "not yet
/// satisfied" and is retried; the deadline is hard.
fn await_condition(
    condition: &Condition,
    session: &mut Session,
    browser: &mut dyn Browser,
) -> Result<()> {
    let timeout = session.timeout();
    let start = Instant::now();
    loop {
        let satisfied = match check_condition(condition, session, browser) {
            Ok(satisfied) => satisfied,
            Err(err) => {
                debug!(error = %err, "condition probe failed, retrying");
                false
            }
        };
        if satisfied {
            return Ok(());
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(WaitTimeoutError { timeout, elapsed }.into());
        }
        thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

fn check_condition(
    condition: &Condition,
    session: &mut Session,
    browser: &mut dyn Browser,
) -> Result<bool> {
    match condition {
        Condition::PageLoad => browser.page_load_complete(),
        Condition::Check {
            get,
            takes_arg,
            invert,
            target,
            value,
        } => Ok(evaluate_check(get, *takes_arg, *invert, session, browser, target, value)?.is_none()),
    }
}
