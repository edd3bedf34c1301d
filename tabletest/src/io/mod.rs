//! Side-effecting pieces: file-backed pages, table/suite parsing from disk,
//! TOML configuration, and JSON run reports.

pub mod browser;
pub mod config;
pub(crate) mod html;
pub mod report;
pub mod suite;
pub mod table;
