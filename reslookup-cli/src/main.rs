//! reslookup CLI - reservation lookup service
//!
//! - `serve`: HTTP lookup endpoint
//! - `lookup`: one invocation from the command line
//! - `provision`: create and seed the backing table
//! - `admin`: drop, clear or reload the backing table

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "reslookup",
    author,
    version,
    about = "Reservation lookup service with self-provisioning backing table"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// TOML parameter file (default: environment and .env files)
    #[arg(long, global = true, value_name = "PATH", env = "RESLOOKUP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP lookup server
    Serve(commands::serve::ServeArgs),
    /// Look up one reservation and print it as JSON
    Lookup(commands::lookup::LookupArgs),
    /// Create the backing table if absent and seed it if empty
    Provision(commands::provision::ProvisionArgs),
    /// Run an operator command against the backing table
    Admin(commands::admin::AdminArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Lookup(args) => commands::run_lookup(args, config).await?,
        Commands::Provision(args) => commands::run_provision(args, config).await?,
        Commands::Admin(args) => commands::run_admin(args, config).await?,
    }
    Ok(())
}
