//! Job command handlers
//!
//! Handles job submission, listing, inspection, results and cancellation.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use qrun_client::QrunClient;
use qrun_core::domain::job::{JobOptions, JobStatus};
use qrun_core::dto::job::{CreateJob, JobStatusResponse};
use std::path::PathBuf;
use std::time::Duration;

use super::colorize_status;
use crate::config::Config;
use crate::id_resolver::resolve_job_id;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a job
    Submit {
        /// Backend in metadata@executor form (e.g. fake_manila@aer)
        #[arg(short, long)]
        backend: String,

        /// Program to run: sampler or estimator
        #[arg(short, long, default_value = "sampler")]
        program: String,

        /// JSON file with the program parameters (`{"pubs": [...]}`)
        #[arg(long, conflicts_with = "params")]
        params_file: Option<PathBuf>,

        /// Inline JSON program parameters
        #[arg(long)]
        params: Option<String>,

        /// Inline JSON execution options (e.g. '{"default_shots": 100}')
        #[arg(long)]
        options: Option<String>,

        /// Session to attach the job to
        #[arg(short, long)]
        session: Option<String>,

        /// Wait for the job to finish and print its result
        #[arg(short, long)]
        wait: bool,
    },
    /// List all jobs
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Print the result of a completed job
    Result {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Cancel a queued job
    Cancel {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Wait until a job reaches a final state
    Wait {
        /// Job ID or unambiguous prefix
        id: String,

        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval: u64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        JobCommands::Submit {
            backend,
            program,
            params_file,
            params,
            options,
            session,
            wait,
        } => {
            let params = read_params(params_file, params)?;
            let options = options
                .map(|raw| {
                    serde_json::from_str::<JobOptions>(&raw).context("--options must be a JSON object")
                })
                .transpose()?;

            let req = CreateJob {
                program_id: program,
                backend,
                params,
                options,
                session_id: session,
            };
            submit_job(&client, req, wait).await
        }
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Result { id } => print_result(&client, &id).await,
        JobCommands::Cancel { id } => cancel_job(&client, &id).await,
        JobCommands::Wait {
            id,
            interval,
            timeout,
        } => {
            let id = resolve_job_id(&client, &id).await?;
            wait_for_job(&client, &id, interval, timeout).await
        }
    }
}

fn read_params(file: Option<PathBuf>, inline: Option<String>) -> Result<serde_json::Value> {
    let raw = match (file, inline) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(inline)) => inline,
        (None, None) => bail!("Provide program parameters with --params-file or --params"),
    };

    serde_json::from_str(&raw).context("Program parameters are not valid JSON")
}

async fn submit_job(client: &QrunClient, req: CreateJob, wait: bool) -> Result<()> {
    let created = client.create_job(&req).await?;

    println!("{} Job submitted", "✓".green());
    println!("  ID:      {}", created.id.cyan());
    println!("  Backend: {}", created.backend);

    if wait {
        println!();
        wait_for_job(client, &created.id, 500, 300).await?;
    }

    Ok(())
}

/// List all jobs
async fn list_jobs(client: &QrunClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Get and display a single job
async fn get_job(client: &QrunClient, id: &str) -> Result<()> {
    let id = resolve_job_id(client, id).await?;
    let job = client.get_job(&id).await?;

    print_job_details(&job);

    Ok(())
}

async fn print_result(client: &QrunClient, id: &str) -> Result<()> {
    let id = resolve_job_id(client, id).await?;
    let result = client.job_results(&id).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

async fn cancel_job(client: &QrunClient, id: &str) -> Result<()> {
    let id = resolve_job_id(client, id).await?;
    let response = client.cancel_job(&id).await?;

    println!("{} {}: {}", "✓".green(), id.cyan(), response.message);

    Ok(())
}

async fn wait_for_job(client: &QrunClient, id: &str, interval_ms: u64, timeout_secs: u64) -> Result<()> {
    println!("{}", format!("Waiting for job {}...", id).dimmed());

    let job = client
        .wait_for_job(
            id,
            Duration::from_millis(interval_ms),
            Duration::from_secs(timeout_secs),
        )
        .await?;

    print_job_details(&job);

    if job.status == JobStatus::Completed {
        let result = client.job_results(id).await?;
        println!("\n{}", "Result:".bold());
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

/// Print a one-entry summary for job listings
fn print_job_summary(job: &JobStatusResponse) {
    println!("  {} Job {}", "▸".cyan(), job.id.dimmed());
    println!("    Program:  {}", job.program_id);
    println!("    Backend:  {}", job.backend);
    println!("    Status:   {}", colorize_status(job.status));
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(session) = &job.session_id {
        println!("    Session:  {}", session.dimmed());
    }
    println!();
}

/// Print detailed job information
fn print_job_details(job: &JobStatusResponse) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.cyan());
    println!("  Program:     {}", job.program_id);
    println!("  Backend:     {}", job.backend);
    println!("  Status:      {}", colorize_status(job.status));
    println!("  Created:     {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(session) = &job.session_id {
        println!("  Session:     {}", session);
    }

    if let Some(started) = job.started_at {
        println!("  Started:     {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = job.completed_at {
        println!("  Completed:   {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.started_at {
            let duration = completed.signed_duration_since(started);
            println!("  Duration:    {}ms", duration.num_milliseconds());
        }
    }

    if let Some(reason) = &job.state.reason {
        println!("\n{}", "Reason:".bold());
        println!("{}", reason.red());
    }
}
