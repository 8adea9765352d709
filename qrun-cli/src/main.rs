//! qrun CLI
//!
//! Command-line interface for interacting with the qrun server.

mod commands;
mod config;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "qrun")]
#[command(about = "Quantum runtime CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "QRUN_SERVER_URL", default_value = "http://localhost:8000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
