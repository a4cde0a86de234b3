// twin/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug twin generate ... pour voir les détails
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            project_dir,
            output_dir,
            offline,
        } => commands::generate::execute(project_dir, output_dir, offline).await,
        Commands::Lineage {
            project_dir,
            format,
        } => commands::lineage::execute(project_dir, format),
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}
