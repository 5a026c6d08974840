// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use hoist::output::OutputMode;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Deploy a Bun app to Cloudflare Workers with a D1 database")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure the custom domain and write a hoist.yml template
    Init {
        /// Zone (apex domain) to serve the app under
        #[arg(short, long, visible_alias = "zone")]
        domain: String,

        /// Subdomain within the zone; omit to use the apex
        #[arg(short, long)]
        subdomain: Option<String>,

        /// Worker name (defaults to the directory name)
        #[arg(long)]
        app: Option<String>,

        /// Overwrite an existing .env
        #[arg(short, long)]
        force: bool,
    },

    /// Build, provision, migrate and deploy
    Deploy {
        /// Break an existing deploy lock
        #[arg(short, long)]
        force: bool,
    },

    /// Show what the ledger records for this project
    Status,

    /// List zones visible to the resolved credential
    Zones,
}
