//! CLI definitions for the `parley` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Conversational chat backend backed by Gemini.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed logs (-v for debug, -vv for trace). Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Host to bind to (overrides config and PARLEY_HOST).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PARLEY_PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the TOML configuration file.
        #[arg(short, long, env = "PARLEY_CONFIG", default_value = "parley.toml")]
        config: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
