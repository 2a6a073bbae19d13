//! Command shell over the goal book and planning engine.

pub mod commands;
pub mod context;
pub mod output;
pub mod registry;
pub mod shell;
pub mod table;

pub use context::{CommandError, ShellContext};
pub use shell::{run_cli, CliMode};
