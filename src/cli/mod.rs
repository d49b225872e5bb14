//! CLI module - argument parsing, interactive prompts and command handlers

mod args;
pub mod commands;
mod prompts;

pub use args::{parse_field_assignment, Cli, Commands, RegistryArgs};
pub use commands::run;
pub use prompts::*;
