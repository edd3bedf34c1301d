//! Next-command supplier abstraction.
//!
//! The loop pulls commands one at a time through [`CommandSupplier`], so
//! the command source (an in-memory table, or a remote-polling fetch)
//! stays swappable behind the same seam.

use std::collections::VecDeque;

use crate::core::command::Command;

/// Source of commands for one run. `None` means the run is complete.
pub trait CommandSupplier {
    fn next(&mut self) -> Option<Command>;
}

/// In-memory supplier over a parsed test's rows, in source order.
#[derive(Debug, Clone)]
pub struct TableCommands {
    commands: VecDeque<Command>,
}

impl TableCommands {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands: commands.into(),
        }
    }
}

impl CommandSupplier for TableCommands {
    fn next(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_commands_in_source_order_then_none() {
        let mut supplier = TableCommands::new(vec![
            Command::new("open", "/a.html", ""),
            Command::new("assertTitle", "A", ""),
        ]);
        assert_eq!(supplier.next().map(|c| c.name), Some("open".to_string()));
        assert_eq!(
            supplier.next().map(|c| c.name),
            Some("assertTitle".to_string())
        );
        assert!(supplier.next().is_none());
    }
}
