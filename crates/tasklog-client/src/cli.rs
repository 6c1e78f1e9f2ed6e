//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tasklog_core::TracingOutputFormat;

/// tasklog - time tracking export and calendar cleanup
#[derive(Debug, Parser)]
#[command(name = "tasklog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "TASKLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format: pretty, compact or json
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export tracked task time to an ICS file
    Export(ExportArgs),

    /// Delete zero- and negative-duration events from the calendar
    Cleanup(CleanupArgs),

    /// Authentication commands
    Auth {
        #[command(subcommand)]
        provider: AuthProvider,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `tasklog export`; each overrides the `[store]`/`[export]` config.
#[derive(Debug, Default, Args)]
pub struct ExportArgs {
    /// Output file (default: out.ics)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Document store base URL
    #[arg(long, env = "SYNC_SERVER")]
    pub server: Option<String>,

    /// Database holding the task documents
    #[arg(long, env = "SYNC_DATABASE")]
    pub database: Option<String>,

    /// Document store user
    #[arg(long, env = "SYNC_USER")]
    pub user: Option<String>,

    /// Document store password (supports `env::` and `pass::` references)
    #[arg(long, env = "SYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Overall time limit for the run, in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,
}

/// Flags for `tasklog cleanup`.
#[derive(Debug, Default, Args)]
pub struct CleanupArgs {
    /// List the events that would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Overall time limit for the run, in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Calendar to clean (default: primary)
    #[arg(long)]
    pub calendar: Option<String>,

    /// OAuth client ID used to refresh the cached token
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret used to refresh the cached token
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

/// Authentication providers.
#[derive(Debug, Subcommand)]
pub enum AuthProvider {
    /// Authorize access to Google Calendar
    #[cfg(feature = "google")]
    Google {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        /// Path to a Google Cloud Console credentials JSON file
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Re-authorize even if cached tokens are present
        #[arg(long, short)]
        force: bool,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Dump the effective configuration
    Dump,

    /// Validate configuration
    Validate,
}
