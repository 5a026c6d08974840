// ABOUTME: Entry point for the hoist CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hoist::config::{Config, InitOptions};
use hoist::error::Result;
use hoist::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());
    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;
    match cli.command {
        Commands::Init {
            domain,
            subdomain,
            app,
            force,
        } => {
            let options = InitOptions {
                zone: domain,
                subdomain,
                app,
                force,
            };
            commands::init(&cwd, &options, output)
        }
        Commands::Deploy { force } => {
            let config = Config::discover(&cwd)?;
            commands::deploy(config, &cwd, force, output).await
        }
        Commands::Status => {
            let config = Config::discover(&cwd)?;
            commands::status(&config, &cwd, output)
        }
        Commands::Zones => {
            let config = Config::discover(&cwd)?;
            commands::zones(&config, &cwd, output).await
        }
    }
}
