//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::identifier::IdentifierKind;
use crate::profiles::{Operation, ResourceKind};

/// Glue lifecycle - wait on and retry asynchronous catalog operations.
#[derive(Parser, Debug)]
#[command(name = "glue-lifecycle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "GLUE_LIFECYCLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode or decode composite identifiers.
    Id {
        /// Identifier subcommand.
        #[command(subcommand)]
        command: IdCommands,
    },

    /// Show the effective resource profiles.
    Profiles {
        /// Only show this kind.
        #[arg(long)]
        kind: Option<ResourceKind>,
    },

    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Wait for a resource to settle.
    Wait {
        /// Resource kind.
        #[arg(long)]
        kind: ResourceKind,

        /// Operation whose wait spec to use.
        #[arg(long, default_value = "create")]
        operation: Operation,

        /// Describe path of the resource.
        #[arg(long)]
        path: String,

        /// Pending states, replacing the profile's.
        #[arg(long)]
        pending: Vec<String>,

        /// Target states, replacing the profile's.
        #[arg(long)]
        target: Vec<String>,

        /// Timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Poll interval in seconds.
        #[arg(long)]
        poll_interval_secs: Option<u64>,

        /// JSON pointer to the state in the describe response.
        #[arg(long)]
        status_pointer: Option<String>,

        /// Name of the entry to read, for kinds listed on their parent
        /// (partition indexes).
        #[arg(long)]
        entry_name: Option<String>,
    },

    /// Run a mutation with retries, then wait for the resource to settle.
    Converge {
        /// Resource kind.
        #[arg(long)]
        kind: ResourceKind,

        /// Operation to perform.
        #[arg(long)]
        operation: Operation,

        /// HTTP method; defaults to POST, PUT or DELETE by operation.
        #[arg(long)]
        method: Option<String>,

        /// Mutation path.
        #[arg(long)]
        path: String,

        /// File holding the JSON request body.
        #[arg(long)]
        body: Option<PathBuf>,

        /// Describe path polled after the mutation.
        #[arg(long)]
        status_path: String,

        /// JSON pointer to the state in the describe response.
        #[arg(long)]
        status_pointer: Option<String>,

        /// Name of the entry to read, for kinds listed on their parent
        /// (partition indexes).
        #[arg(long)]
        entry_name: Option<String>,
    },
}

/// Identifier subcommands.
#[derive(Subcommand, Debug)]
pub enum IdCommands {
    /// Build an identifier from its fields.
    Encode {
        /// Identifier kind.
        #[arg(long)]
        kind: IdentifierKind,

        /// Fields in order; partition values follow the table name.
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Split an identifier into named fields.
    Decode {
        /// Identifier kind.
        #[arg(long)]
        kind: IdentifierKind,

        /// Identifier to decode.
        id: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
