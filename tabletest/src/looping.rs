//! The test execution loop: strictly sequential, one command in flight,
//! resumable across pauses.
//!
//! The loop pulls commands from a [`CommandSupplier`], runs each through
//! [`crate::step::run_command`], and stops on completion, abort, a halting
//! failure, or a fault. Faults are recovered here and folded into the
//! returned [`RunStop`]; nothing propagates past `run` uncaught.

use tracing::{debug, warn};

use crate::core::command::Command;
use crate::core::registry::Registry;
use crate::core::session::{AbortHandle, Session};
use crate::core::supplier::{CommandSupplier, TableCommands};
use crate::io::table::TestCase;
use crate::step::{CommandResult, CommandStatus, run_command};

/// Reason the loop returned control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    /// No commands remain.
    Complete,
    /// A breakpoint (or negative speed) paused the run before a command;
    /// calling `run` again resumes at that command.
    Paused,
    /// The abort flag was set; no further command was selected.
    Aborted,
    /// A halting assertion failure stopped the run.
    Failed { message: String },
    /// A fault (unknown command, wait timeout, handler error) ended the run.
    Error { message: String },
}

/// Policy for breakpoints when driving a run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakPolicy {
    /// Log the pause and resume immediately.
    Resume,
    /// Return control to the caller at the pause.
    Stop,
}

/// Summary of a completed (or stopped) test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub title: String,
    pub results: Vec<CommandResult>,
    pub stop: RunStop,
    /// True when any command failed or faulted, halting or not.
    pub failed: bool,
}

/// One in-progress test run: supplier position, session, recorded results.
pub struct TestRun<'a, S: CommandSupplier> {
    registry: &'a Registry,
    supplier: S,
    session: Session,
    pending: Option<Command>,
    skip_pause_check: bool,
    results: Vec<CommandResult>,
    failed: bool,
}

impl<'a, S: CommandSupplier> TestRun<'a, S> {
    pub fn new(registry: &'a Registry, supplier: S, session: Session) -> Self {
        Self {
            registry,
            supplier,
            session,
            pending: None,
            skip_pause_check: false,
            results: Vec::new(),
            failed: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.session.abort_handle()
    }

    pub fn results(&self) -> &[CommandResult] {
        &self.results
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_results(self) -> Vec<CommandResult> {
        self.results
    }

    /// Drive the loop until it stops. After [`RunStop::Paused`], calling
    /// `run` again resumes with the command that triggered the pause.
    pub fn run(
        &mut self,
        browser: &mut dyn crate::core::browser::Browser,
        on_command: &mut dyn FnMut(&CommandResult),
    ) -> RunStop {
        loop {
            if self.session.aborted() {
                debug!("abort flag set, stopping before next command");
                return RunStop::Aborted;
            }

            let command = match self.pending.take().or_else(|| self.supplier.next()) {
                Some(command) => command,
                None => return RunStop::Complete,
            };

            let resuming = std::mem::take(&mut self.skip_pause_check);
            if !resuming && (command.breakpoint || self.session.speed_ms() < 0) {
                debug!(command = %command.name, "pausing before command");
                self.pending = Some(command);
                self.skip_pause_check = true;
                return RunStop::Paused;
            }

            match run_command(self.registry, &mut self.session, browser, &command) {
                Ok(step) => {
                    let halting_failure = step.halt && step.result.status == CommandStatus::Failed;
                    if step.result.status == CommandStatus::Failed {
                        self.failed = true;
                    }
                    let message = step.result.message.clone();
                    self.results.push(step.result);
                    on_command(self.results.last().expect("just pushed"));
                    if halting_failure {
                        return RunStop::Failed {
                            message: message.unwrap_or_default(),
                        };
                    }
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    self.failed = true;
                    self.results.push(CommandResult {
                        command,
                        status: CommandStatus::Error,
                        message: Some(message.clone()),
                        value: None,
                    });
                    on_command(self.results.last().expect("just pushed"));
                    return RunStop::Error { message };
                }
            }
        }
    }
}

/// Run one parsed test to its terminal stop, applying the breakpoint
/// policy. The outcome is produced exactly once per run.
pub fn run_test(
    registry: &Registry,
    test: &TestCase,
    session: Session,
    browser: &mut dyn crate::core::browser::Browser,
    break_policy: BreakPolicy,
    mut on_command: impl FnMut(&CommandResult),
) -> TestOutcome {
    let mut run = TestRun::new(registry, TableCommands::new(test.commands.clone()), session);
    let stop = loop {
        let stop = run.run(browser, &mut on_command);
        if stop == RunStop::Paused && break_policy == BreakPolicy::Resume {
            warn!(test = %test.title, "breakpoint hit, resuming");
            continue;
        }
        break stop;
    };
    let failed = run.failed();
    TestOutcome {
        title: test.title.clone(),
        results: run.into_results(),
        stop,
        failed,
    }
}
