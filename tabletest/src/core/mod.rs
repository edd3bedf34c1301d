//! Pure command-model logic: commands, patterns, the registry, and session
//! state. No filesystem or page access happens here; the [`browser::Browser`]
//! trait is the seam behind which all side effects live.

pub mod browser;
pub mod command;
pub mod pattern;
pub mod registry;
pub mod session;
pub mod substitute;
pub mod supplier;
