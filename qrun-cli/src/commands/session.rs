//! Session command handlers
//!
//! Opens, inspects, toggles, closes and cancels sessions.

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use colored::*;
use qrun_client::QrunClient;
use qrun_core::domain::session::{DEFAULT_MAX_TTL_SECS, SessionMode, SessionView};
use qrun_core::dto::session::CreateSession;

use super::yes_no;
use crate::config::Config;
use crate::id_resolver::resolve_session_id;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Dedicated,
    Batch,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Dedicated => SessionMode::Dedicated,
            ModeArg::Batch => SessionMode::Batch,
        }
    }
}

/// Session subcommands
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Open a session bound to a backend
    Create {
        /// Backend in metadata@executor form
        #[arg(short, long)]
        backend: String,

        /// Execution mode
        #[arg(short, long, value_enum, default_value = "dedicated")]
        mode: ModeArg,

        /// Maximum lifetime in seconds
        #[arg(long, default_value_t = DEFAULT_MAX_TTL_SECS)]
        max_ttl: u64,

        /// Optional instance identifier
        #[arg(long)]
        instance: Option<String>,
    },
    /// List all sessions
    List,
    /// Get session details
    Get {
        /// Session ID or unambiguous prefix
        id: String,
    },
    /// Allow or stop new jobs in a session
    Accept {
        /// Session ID or unambiguous prefix
        id: String,

        /// Stop accepting new jobs instead
        #[arg(long)]
        off: bool,
    },
    /// Close a session; queued jobs still run
    Close {
        /// Session ID or unambiguous prefix
        id: String,
    },
    /// Cancel a session and its queued jobs
    Cancel {
        /// Session ID or unambiguous prefix
        id: String,
    },
}

/// Handle session commands
pub async fn handle_session_command(command: SessionCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        SessionCommands::Create {
            backend,
            mode,
            max_ttl,
            instance,
        } => {
            let req = CreateSession {
                mode: mode.into(),
                backend,
                instance,
                max_ttl,
            };
            let session = client.create_session(&req).await?;
            println!("{} Session created", "✓".green());
            print_session_details(&session);
            Ok(())
        }
        SessionCommands::List => list_sessions(&client).await,
        SessionCommands::Get { id } => {
            let id = resolve_session_id(&client, &id).await?;
            print_session_details(&client.get_session(&id).await?);
            Ok(())
        }
        SessionCommands::Accept { id, off } => {
            let id = resolve_session_id(&client, &id).await?;
            let session = client.update_session(&id, !off).await?;
            println!(
                "{} Session {} accepting jobs: {}",
                "✓".green(),
                session.id.cyan(),
                yes_no(session.accepting_jobs)
            );
            Ok(())
        }
        SessionCommands::Close { id } => {
            let id = resolve_session_id(&client, &id).await?;
            client.close_session(&id).await?;
            println!("{} Session {} closed", "✓".green(), id.cyan());
            Ok(())
        }
        SessionCommands::Cancel { id } => {
            let id = resolve_session_id(&client, &id).await?;
            client.cancel_session(&id).await?;
            println!(
                "{} Session {} cancelled along with its queued jobs",
                "✓".green(),
                id.cyan()
            );
            Ok(())
        }
    }
}

async fn list_sessions(client: &QrunClient) -> Result<()> {
    let sessions = client.list_sessions().await?;

    if sessions.is_empty() {
        println!("{}", "No sessions found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} session(s):", sessions.len()).bold());
    println!();
    for session in sessions {
        let state = if session.active {
            "active".green()
        } else {
            "inactive".dimmed()
        };
        println!("  {} Session {}", "▸".cyan(), session.id.dimmed());
        println!("    Backend:  {}", session.backend);
        println!("    Mode:     {}", session.mode);
        println!("    State:    {}", state);
        println!("    Jobs:     {}", session.jobs.len());
        println!();
    }

    Ok(())
}

fn print_session_details(session: &SessionView) {
    println!("{}", "Session Details:".bold());
    println!("  ID:             {}", session.id.cyan());
    println!("  Backend:        {}", session.backend);
    println!("  Mode:           {}", session.mode);
    if let Some(instance) = &session.instance {
        println!("  Instance:       {}", instance);
    }
    println!("  Active:         {}", yes_no(session.active));
    println!("  Accepting jobs: {}", yes_no(session.accepting_jobs));
    println!(
        "  Elapsed:        {}s of {}s",
        session.elapsed_time, session.max_ttl
    );
    println!("  Created:        {}", session.created_at.format("%Y-%m-%d %H:%M:%S"));

    if !session.jobs.is_empty() {
        println!("\n{}", "Jobs:".bold());
        for job in &session.jobs {
            println!("  {}", job);
        }
    }
}
