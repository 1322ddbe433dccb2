//! One-shot lookup from the command line

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use reslookup_core::{run_invocation, Invocation, ReservationId};

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Reservation id (confirmation code) to look up
    pub id: String,

    /// Operator command to run before the lookup (droptable, deletetable, inserttable)
    #[arg(long)]
    pub command: Option<String>,
}

/// Run one invocation and print the record as JSON
pub async fn run_lookup(args: LookupArgs, config_path: Option<&Path>) -> Result<()> {
    let id = ReservationId::new(&args.id).context("invalid reservation id")?;
    let config = super::load_config(config_path)?;
    let (connector, feed) = super::connect(&config)?;

    let mut invocation = Invocation::new(id);
    if let Some(command) = args.command {
        invocation = invocation.with_command(command);
    }

    let record = run_invocation(&connector, &feed, &config.table, &invocation)
        .await
        .context("lookup failed")?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
