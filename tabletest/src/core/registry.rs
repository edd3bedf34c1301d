//! Command registry: explicit name → handler table with derived-command
//! synthesis.
//!
//! Handlers come in three registered shapes (actions, accessors, and
//! assertions), and each registration fans out into the full derived set:
//!
//! - `register_action("open", …)` yields `open` and `openAndWait`;
//! - `register_accessor("Title", …)` yields the accessor itself
//!   (`getTitle`/`isTitle`) plus `storeTitle`, `assertTitle`,
//!   `assertNotTitle`, `verifyTitle`, `verifyNotTitle`, `waitForTitle`,
//!   and `waitForNotTitle`;
//! - `register_assertion("Checked", …)` yields `assertChecked` (halting)
//!   and `verifyChecked` (non-halting).
//!
//! Registration is idempotent: re-registering a name replaces its handler,
//! so registering the same vocabulary twice yields an identical command set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::core::browser::Browser;
use crate::core::pattern::Pattern;
use crate::core::session::Session;

/// Value produced by an accessor: a string (`get*`) or a predicate (`is*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorValue {
    Str(String),
    Bool(bool),
}

impl fmt::Display for AccessorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorValue::Str(s) => f.write_str(s),
            AccessorValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Whether an accessor is a string value (`getFoo`) or a predicate (`isFoo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Value,
    Predicate,
}

pub type ActionFn = Arc<dyn Fn(&mut Session, &mut dyn Browser, &str, &str) -> Result<()> + Send + Sync>;
pub type AccessorFn =
    Arc<dyn Fn(&mut Session, &mut dyn Browser, &str) -> Result<AccessorValue> + Send + Sync>;
pub type AssertFn =
    Arc<dyn Fn(&mut Session, &mut dyn Browser, &str, &str) -> Result<Option<String>> + Send + Sync>;

/// Registered behavior bound to one command name.
#[derive(Clone)]
pub enum Handler {
    /// Procedure; `and_wait` awaits the page-load condition afterwards.
    Action { run: ActionFn, and_wait: bool },
    /// Returns a value. `takes_arg` accessors consume the target as their
    /// argument; the expected pattern then comes from the value column.
    Accessor { get: AccessorFn, takes_arg: bool },
    /// Store the accessor result into a named session variable.
    Store { get: AccessorFn, takes_arg: bool },
    /// Compare the accessor result against an expected pattern.
    Check {
        get: AccessorFn,
        takes_arg: bool,
        halt: bool,
        invert: bool,
    },
    /// Poll the comparison until it passes or the wait deadline expires.
    WaitFor {
        get: AccessorFn,
        takes_arg: bool,
        invert: bool,
    },
    /// Direct assertion: `Ok(None)` passes, `Ok(Some(msg))` fails.
    Assert { check: AssertFn, halt: bool },
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action { and_wait, .. } => f
                .debug_struct("Action")
                .field("and_wait", and_wait)
                .finish_non_exhaustive(),
            Handler::Accessor { takes_arg, .. } => f
                .debug_struct("Accessor")
                .field("takes_arg", takes_arg)
                .finish_non_exhaustive(),
            Handler::Store { takes_arg, .. } => f
                .debug_struct("Store")
                .field("takes_arg", takes_arg)
                .finish_non_exhaustive(),
            Handler::Check {
                takes_arg,
                halt,
                invert,
                ..
            } => f
                .debug_struct("Check")
                .field("takes_arg", takes_arg)
                .field("halt", halt)
                .field("invert", invert)
                .finish_non_exhaustive(),
            Handler::WaitFor {
                takes_arg, invert, ..
            } => f
                .debug_struct("WaitFor")
                .field("takes_arg", takes_arg)
                .field("invert", invert)
                .finish_non_exhaustive(),
            Handler::Assert { halt, .. } => f
                .debug_struct("Assert")
                .field("halt", halt)
                .finish_non_exhaustive(),
        }
    }
}

/// Dispatch of an unregistered command name.
#[derive(Debug)]
pub struct UnknownCommandError {
    pub name: String,
}

impl fmt::Display for UnknownCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown command: '{}'", self.name)
    }
}

impl std::error::Error for UnknownCommandError {}

/// Result of invoking a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Action or passing check completed.
    Ok,
    /// Accessor produced a value.
    OkValue(String),
    /// Assertion or check failed; `halt` carries the failure policy.
    Failed { message: String, halt: bool },
}

/// Termination condition a command leaves behind for the loop to poll.
#[derive(Clone)]
pub enum Condition {
    /// Wait until the browser reports the pending page load complete.
    PageLoad,
    /// Wait until an accessor comparison passes.
    Check {
        get: AccessorFn,
        takes_arg: bool,
        invert: bool,
        target: String,
        value: String,
    },
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::PageLoad => f.write_str("PageLoad"),
            Condition::Check {
                takes_arg,
                invert,
                target,
                value,
                ..
            } => f
                .debug_struct("Check")
                .field("takes_arg", takes_arg)
                .field("invert", invert)
                .field("target", target)
                .field("value", value)
                .finish_non_exhaustive(),
        }
    }
}

/// Handler invocation result: immediate outcome plus an optional condition
/// the loop must await before selecting the next command.
#[derive(Debug)]
pub struct Dispatched {
    pub outcome: CommandOutcome,
    pub condition: Option<Condition>,
}

impl Dispatched {
    fn ok() -> Self {
        Self {
            outcome: CommandOutcome::Ok,
            condition: None,
        }
    }
}

/// Name-keyed handler table. Built once at startup, immutable during a run.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: BTreeMap<String, Handler>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under `name`, plus its `…AndWait` variant.
    pub fn register_action<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut Session, &mut dyn Browser, &str, &str) -> Result<()> + Send + Sync + 'static,
    {
        let run: ActionFn = Arc::new(f);
        self.handlers.insert(
            name.to_string(),
            Handler::Action {
                run: Arc::clone(&run),
                and_wait: false,
            },
        );
        self.handlers
            .insert(format!("{name}AndWait"), Handler::Action { run, and_wait: true });
    }

    /// Register an accessor for `stem` (capitalized, e.g. `Title`) and
    /// synthesize its full derived command set.
    pub fn register_accessor<F>(&mut self, stem: &str, kind: AccessorKind, takes_arg: bool, f: F)
    where
        F: Fn(&mut Session, &mut dyn Browser, &str) -> Result<AccessorValue> + Send + Sync + 'static,
    {
        let get: AccessorFn = Arc::new(f);
        let own = match kind {
            AccessorKind::Value => format!("get{stem}"),
            AccessorKind::Predicate => format!("is{stem}"),
        };
        self.handlers.insert(
            own,
            Handler::Accessor {
                get: Arc::clone(&get),
                takes_arg,
            },
        );
        self.handlers.insert(
            format!("store{stem}"),
            Handler::Store {
                get: Arc::clone(&get),
                takes_arg,
            },
        );
        for (prefix, halt) in [("assert", true), ("verify", false)] {
            for (infix, invert) in [("", false), ("Not", true)] {
                self.handlers.insert(
                    format!("{prefix}{infix}{stem}"),
                    Handler::Check {
                        get: Arc::clone(&get),
                        takes_arg,
                        halt,
                        invert,
                    },
                );
            }
        }
        for (infix, invert) in [("", false), ("Not", true)] {
            self.handlers.insert(
                format!("waitFor{infix}{stem}"),
                Handler::WaitFor {
                    get: Arc::clone(&get),
                    takes_arg,
                    invert,
                },
            );
        }
    }

    /// Register a direct assertion for `stem`: `assert<stem>` halts on
    /// failure, `verify<stem>` records and continues.
    pub fn register_assertion<F>(&mut self, stem: &str, f: F)
    where
        F: Fn(&mut Session, &mut dyn Browser, &str, &str) -> Result<Option<String>>
            + Send
            + Sync
            + 'static,
    {
        let check: AssertFn = Arc::new(f);
        self.handlers.insert(
            format!("assert{stem}"),
            Handler::Assert {
                check: Arc::clone(&check),
                halt: true,
            },
        );
        self.handlers
            .insert(format!("verify{stem}"), Handler::Assert { check, halt: false });
    }

    /// Alias `from` to an already-registered command.
    pub fn alias(&mut self, from: &str, to: &str) -> Result<()> {
        let handler = self
            .handlers
            .get(to)
            .cloned()
            .ok_or_else(|| UnknownCommandError { name: to.to_string() })?;
        self.handlers.insert(from.to_string(), handler);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Look up a handler, failing fast with [`UnknownCommandError`].
    pub fn lookup(&self, name: &str) -> Result<&Handler> {
        self.handlers
            .get(name)
            .ok_or_else(|| UnknownCommandError { name: name.to_string() }.into())
    }

    /// All registered command names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Look up and invoke in one step.
    pub fn dispatch(
        &self,
        name: &str,
        session: &mut Session,
        browser: &mut dyn Browser,
        target: &str,
        value: &str,
    ) -> Result<Dispatched> {
        let handler = self.lookup(name)?;
        execute(handler, session, browser, target, value)
    }
}

/// Invoke a handler with already-substituted arguments.
pub fn execute(
    handler: &Handler,
    session: &mut Session,
    browser: &mut dyn Browser,
    target: &str,
    value: &str,
) -> Result<Dispatched> {
    match handler {
        Handler::Action { run, and_wait } => {
            run(session, browser, target, value)?;
            Ok(Dispatched {
                outcome: CommandOutcome::Ok,
                condition: and_wait.then_some(Condition::PageLoad),
            })
        }
        Handler::Accessor { get, takes_arg } => {
            let (arg, _) = accessor_args(*takes_arg, target, value);
            let got = get(session, browser, arg)?;
            Ok(Dispatched {
                outcome: CommandOutcome::OkValue(got.to_string()),
                condition: None,
            })
        }
        Handler::Store { get, takes_arg } => {
            let (arg, var_name) = accessor_args(*takes_arg, target, value);
            if var_name.is_empty() {
                anyhow::bail!("store: missing variable name");
            }
            let got = get(session, browser, arg)?;
            session.set_var(var_name, &got.to_string());
            Ok(Dispatched::ok())
        }
        Handler::Check {
            get,
            takes_arg,
            halt,
            invert,
        } => {
            let failure = evaluate_check(get, *takes_arg, *invert, session, browser, target, value)?;
            Ok(Dispatched {
                outcome: match failure {
                    None => CommandOutcome::Ok,
                    Some(message) => CommandOutcome::Failed {
                        message,
                        halt: *halt,
                    },
                },
                condition: None,
            })
        }
        Handler::WaitFor {
            get,
            takes_arg,
            invert,
        } => Ok(Dispatched {
            outcome: CommandOutcome::Ok,
            condition: Some(Condition::Check {
                get: Arc::clone(get),
                takes_arg: *takes_arg,
                invert: *invert,
                target: target.to_string(),
                value: value.to_string(),
            }),
        }),
        Handler::Assert { check, halt } => {
            let failure = check(session, browser, target, value)?;
            Ok(Dispatched {
                outcome: match failure {
                    None => CommandOutcome::Ok,
                    Some(message) => CommandOutcome::Failed {
                        message,
                        halt: *halt,
                    },
                },
                condition: None,
            })
        }
    }
}

/// Compare an accessor result against its expected pattern.
///
/// Returns `Ok(None)` on pass, `Ok(Some(message))` on failure. Predicate
/// accessors have no expected pattern; the check passes when the predicate
/// equals the non-inverted sense.
pub fn evaluate_check(
    get: &AccessorFn,
    takes_arg: bool,
    invert: bool,
    session: &mut Session,
    browser: &mut dyn Browser,
    target: &str,
    value: &str,
) -> Result<Option<String>> {
    let (arg, expected) = accessor_args(takes_arg, target, value);
    match get(session, browser, arg)? {
        AccessorValue::Bool(actual) => {
            if actual != invert {
                Ok(None)
            } else {
                Ok(Some(format!(
                    "Actual value '{actual}' did not match '{}'",
                    !invert
                )))
            }
        }
        AccessorValue::Str(actual) => {
            let matched = Pattern::parse(expected).matches(&actual)?;
            if matched != invert {
                Ok(None)
            } else if invert {
                Ok(Some(format!("Actual value '{actual}' did match '{expected}'")))
            } else {
                Ok(Some(format!(
                    "Actual value '{actual}' did not match '{expected}'"
                )))
            }
        }
    }
}

/// Split command arguments for an accessor-derived handler: accessors that
/// take an argument consume the target, leaving the value column for the
/// expected pattern or variable name; zero-argument accessors use the
/// target column instead.
fn accessor_args<'a>(takes_arg: bool, target: &'a str, value: &'a str) -> (&'a str, &'a str) {
    if takes_arg { (target, value) } else { ("", target) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBrowser;

    fn registry_with_title() -> Registry {
        let mut registry = Registry::new();
        registry.register_accessor("Title", AccessorKind::Value, false, |_, browser, _| {
            Ok(AccessorValue::Str(browser.title()?))
        });
        registry
    }

    #[test]
    fn accessor_registration_synthesizes_derived_set() {
        let registry = registry_with_title();
        for name in [
            "getTitle",
            "storeTitle",
            "assertTitle",
            "assertNotTitle",
            "verifyTitle",
            "verifyNotTitle",
            "waitForTitle",
            "waitForNotTitle",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.names().count(), 8);
    }

    #[test]
    fn unknown_command_fails_with_exact_message() {
        let registry = Registry::new();
        let err = registry.lookup("doesNotExist").unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: 'doesNotExist'");
        assert!(err.downcast_ref::<UnknownCommandError>().is_some());
    }

    #[test]
    fn check_reports_both_expected_and_actual() {
        let registry = registry_with_title();
        let mut session = Session::new();
        let mut browser = ScriptedBrowser::new();
        browser.title = "hello".to_string();

        let dispatched = registry
            .dispatch("assertTitle", &mut session, &mut browser, "goodbye*", "")
            .expect("dispatch");
        assert_eq!(
            dispatched.outcome,
            CommandOutcome::Failed {
                message: "Actual value 'hello' did not match 'goodbye*'".to_string(),
                halt: true,
            }
        );
    }

    #[test]
    fn negated_check_inverts_the_sense() {
        let registry = registry_with_title();
        let mut session = Session::new();
        let mut browser = ScriptedBrowser::new();
        browser.title = "hello".to_string();

        let pass = registry
            .dispatch("assertNotTitle", &mut session, &mut browser, "goodbye*", "")
            .expect("dispatch");
        assert_eq!(pass.outcome, CommandOutcome::Ok);

        let fail = registry
            .dispatch("verifyNotTitle", &mut session, &mut browser, "hel*", "")
            .expect("dispatch");
        assert_eq!(
            fail.outcome,
            CommandOutcome::Failed {
                message: "Actual value 'hello' did match 'hel*'".to_string(),
                halt: false,
            }
        );
    }

    #[test]
    fn store_requires_a_variable_name() {
        let registry = registry_with_title();
        let mut session = Session::new();
        let mut browser = ScriptedBrowser::new();
        let err = registry
            .dispatch("storeTitle", &mut session, &mut browser, "", "")
            .unwrap_err();
        assert!(err.to_string().contains("missing variable name"));
    }

    #[test]
    fn store_writes_session_variable() {
        let registry = registry_with_title();
        let mut session = Session::new();
        let mut browser = ScriptedBrowser::new();
        browser.title = "stored title".to_string();

        registry
            .dispatch("storeTitle", &mut session, &mut browser, "t", "")
            .expect("dispatch");
        assert_eq!(session.var("t"), Some("stored title"));
    }

    #[test]
    fn action_and_wait_produces_page_load_condition() {
        let mut registry = Registry::new();
        registry.register_action("open", |_, browser, target, _| browser.open(target));
        let mut session = Session::new();
        let mut browser = ScriptedBrowser::new();

        let plain = registry
            .dispatch("open", &mut session, &mut browser, "/a.html", "")
            .expect("dispatch");
        assert!(plain.condition.is_none());

        let waiting = registry
            .dispatch("openAndWait", &mut session, &mut browser, "/b.html", "")
            .expect("dispatch");
        assert!(matches!(waiting.condition, Some(Condition::PageLoad)));
        assert_eq!(browser.opened, vec!["/a.html", "/b.html"]);
    }

    #[test]
    fn reregistration_replaces_without_duplicating() {
        let mut registry = registry_with_title();
        let before: Vec<String> = registry.names().map(str::to_string).collect();
        registry.register_accessor("Title", AccessorKind::Value, false, |_, browser, _| {
            Ok(AccessorValue::Str(browser.title()?))
        });
        let after: Vec<String> = registry.names().map(str::to_string).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn alias_points_at_existing_handler() {
        let mut registry = registry_with_title();
        registry.alias("grabTitle", "storeTitle").expect("alias");
        assert!(registry.contains("grabTitle"));
        assert!(registry.alias("x", "nope").is_err());
    }
}
