//! Table-driven web-test runner.
//!
//! Tests are HTML tables of `(command, target, value)` rows. A registry
//! maps command names to handlers and synthesizes the derived command set
//! (`…AndWait`, `store*`, `assert*`/`verify*` and their negations,
//! `waitFor*`); a strictly sequential loop executes one command at a time,
//! polling termination conditions at a fixed interval.
//!
//! Layering:
//!
//! - [`core`]: pure command/registry/session logic behind the
//!   [`core::browser::Browser`] seam;
//! - [`io`]: the file-backed browser, table/suite parsing, config, reports;
//! - crate root: the execution loop ([`step`], [`looping`], [`suite_run`])
//!   and the built-in vocabulary ([`commands`]).

pub mod commands;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod step;
pub mod suite_run;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
