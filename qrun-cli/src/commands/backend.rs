//! Backend command handlers
//!
//! Lists virtual backends and shows their configuration and status.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use qrun_client::QrunClient;
use qrun_core::domain::backend::BackendConfiguration;

use super::yes_no;
use crate::config::Config;

/// Backend subcommands
#[derive(Subcommand)]
pub enum BackendCommands {
    /// List all virtual backends
    List,
    /// Show a backend's configuration
    Config {
        /// Backend in metadata@executor form
        name: String,
    },
    /// Show a backend's status and queue length
    Status {
        /// Backend in metadata@executor form
        name: String,
    },
}

/// Handle backend commands
pub async fn handle_backend_command(command: BackendCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        BackendCommands::List => list_backends(&client).await,
        BackendCommands::Config { name } => show_configuration(&client, &name).await,
        BackendCommands::Status { name } => show_status(&client, &name).await,
    }
}

async fn list_backends(client: &QrunClient) -> Result<()> {
    let info = client.server_info().await?;
    let backends = client.list_backends().await?;

    println!(
        "{}",
        format!(
            "Server {} (executors: {})",
            info.version,
            info.executors.join(", ")
        )
        .dimmed()
    );

    if backends.is_empty() {
        println!("{}", "No backends available.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} backend(s):", backends.len()).bold());
    println!();
    for backend in backends {
        println!(
            "  {} {:<32} {:>3} qubits{}",
            "▸".cyan(),
            backend.backend_name,
            backend.n_qubits,
            if backend.simulator {
                " (simulator)".dimmed()
            } else {
                "".normal()
            }
        );
    }

    Ok(())
}

async fn show_configuration(client: &QrunClient, name: &str) -> Result<()> {
    let backend = client.backend_configuration(name).await?;
    print_configuration(&backend);
    Ok(())
}

async fn show_status(client: &QrunClient, name: &str) -> Result<()> {
    let status = client.backend_status(name).await?;

    println!("{}", format!("Backend {}:", name).bold());
    println!("  Operational: {}", yes_no(status.state));
    println!("  Status:      {}", status.status);
    println!("  Queue:       {} job(s)", status.length_queue);
    println!("  Version:     {}", status.backend_version.dimmed());

    Ok(())
}

fn print_configuration(backend: &BackendConfiguration) {
    println!("{}", "Backend Configuration:".bold());
    println!("  Name:        {}", backend.backend_name.cyan());
    println!("  Version:     {}", backend.backend_version);
    println!("  Executor:    {}", backend.executor);
    println!("  Qubits:      {}", backend.n_qubits);
    println!("  Simulator:   {}", yes_no(backend.simulator));
    println!("  Max shots:   {}", backend.max_shots);
    println!("  Basis gates: {}", backend.basis_gates.join(", "));

    match &backend.coupling_map {
        Some(edges) => {
            let edges: Vec<String> = edges.iter().map(|[a, b]| format!("{}-{}", a, b)).collect();
            println!("  Coupling:    {}", edges.join(" "));
        }
        None => println!("  Coupling:    {}", "all-to-all".dimmed()),
    }
}
