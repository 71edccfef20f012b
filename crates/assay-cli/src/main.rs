//! Assay CLI - field profiling and capability recommendation.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Evaluate {
            dir,
            dataset,
            engine,
        } => commands::evaluate::run(dir, dataset, engine, cli.verbose).await,

        Commands::Batch { dir, engine } => commands::batch::run(dir, engine, cli.verbose).await,

        Commands::Recommend { file, json } => commands::recommend::run(file, json),

        Commands::Dictionary { dictionary } => commands::dictionary::run(dictionary),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
