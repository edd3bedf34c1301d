//! The command record: one row of a test table.

use serde::{Deserialize, Serialize};

/// One `(name, target, value)` instruction extracted from a test table.
///
/// Immutable once parsed; produced from one table row and consumed exactly
/// once by the execution loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Registered command name, e.g. `open` or `assertTitle`.
    pub name: String,
    /// First argument (locator, URL, or expected pattern).
    pub target: String,
    /// Second argument (value, expected pattern, or variable name).
    pub value: String,
    /// When set, the loop pauses before executing this command.
    #[serde(default)]
    pub breakpoint: bool,
}

impl Command {
    pub fn new(name: &str, target: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            value: value.to_string(),
            breakpoint: false,
        }
    }
}
