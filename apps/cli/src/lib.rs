//! Parley CLI: resolve tenant hosts and chat with a tenant from the
//! terminal.

pub use cmd::{Cli, Command};

pub mod cmd;
pub mod config;
pub mod repl;
pub mod surface;
