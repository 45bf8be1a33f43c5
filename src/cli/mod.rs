//! CLI module for the lifecycle tool.
//!
//! This module provides the command-line interface for encoding
//! identifiers, inspecting profiles, and waiting on resources.

mod commands;
mod output;

pub use commands::{Cli, Commands, IdCommands, OutputFormat};
pub use output::OutputFormatter;
