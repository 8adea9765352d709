//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod backend;
mod job;
mod session;

pub use backend::BackendCommands;
pub use job::JobCommands;
pub use session::SessionCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use qrun_core::domain::job::JobStatus;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Backend discovery
    Backend {
        #[command(subcommand)]
        command: BackendCommands,
    },
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Session management
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Backend { command } => backend::handle_backend_command(command, config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Session { command } => session::handle_session_command(command, config).await,
    }
}

/// Colorize job status for display
pub(crate) fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Queued => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}

/// Yes/no marker for boolean flags
pub(crate) fn yes_no(flag: bool) -> ColoredString {
    if flag { "yes".green() } else { "no".red() }
}
