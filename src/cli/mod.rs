//! Line-oriented shell over the billing manager.

pub mod commands;
pub mod core;
pub mod io;
pub mod output;
mod shell;

pub use self::core::{CliError, CliMode, CommandError, ShellContext};
pub use shell::{run_cli, SCRIPT_ENV};
