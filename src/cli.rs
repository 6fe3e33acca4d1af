use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "mallet",
    about = "Drive a remote management CLI and parse its output",
    version
)]
pub struct Cli {
    /// Print results as JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file path (overrides MALLET_CONFIG and the platform dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write the endpoint/tool configuration
    Init {
        /// Management host to drive over ssh (omit to run the tool locally)
        #[arg(long)]
        host: Option<String>,
        /// ssh user on the management host
        #[arg(long)]
        user: Option<String>,
        /// ssh port on the management host
        #[arg(long)]
        port: Option<u16>,
        /// Base URL of the management API, for `mallet doctor`
        #[arg(long)]
        api_url: Option<String>,
        /// Management tool binary name or path
        #[arg(long)]
        binary: Option<String>,
        /// Tool login passed as --username
        #[arg(long)]
        username: Option<String>,
        /// Tool password passed as --password
        #[arg(long)]
        password: Option<String>,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
        /// Print config path and exit
        #[arg(long)]
        show_path: bool,
    },
    /// List cataloged resources and their actions
    Resources {
        /// Show a single resource
        resource: Option<String>,
    },
    /// Run one cataloged action against the endpoint
    Run {
        /// Resource name (e.g. "capsule")
        resource: String,
        /// Action name (e.g. "content-synchronize")
        action: String,
        /// Tool option as key=value, or a bare key for a valueless flag (repeatable)
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
        /// Override the action's default output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Override the action's timeout
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Tolerate stderr noise when the exit status is zero
        #[arg(long)]
        ignore_stderr: bool,
        /// Report the raw exit code/stdout/stderr without judging the outcome
        #[arg(long)]
        raw: bool,
    },
    /// Capsule content operations
    Capsule {
        #[command(subcommand)]
        command: CapsuleCommand,
    },
    /// Check that the endpoint, tool, and API are reachable
    Doctor,
}

#[derive(Subcommand)]
pub enum CapsuleCommand {
    /// Synchronize capsule content
    Sync {
        /// Capsule id
        #[arg(long)]
        id: u64,
        /// Poll the sync status until it settles
        #[arg(long)]
        wait: bool,
        /// Overall timeout for the sync (and the wait, with --wait)
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Seconds between status polls
        #[arg(long, default_value_t = 10, value_name = "SECS")]
        poll_secs: u64,
    },
    /// Show capsule sync status
    Status {
        /// Capsule id
        #[arg(long)]
        id: u64,
    },
}
