//! Process exit codes for the CLI.

/// Everything ran and passed.
pub const OK: u8 = 0;
/// The run completed but at least one test failed.
pub const FAILED: u8 = 1;
/// Bad input: unreadable files, invalid config, malformed tables.
pub const INVALID: u8 = 2;
