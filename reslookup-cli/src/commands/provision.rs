//! Provision the backing table without a lookup

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use reslookup_core::{provision_once, MySqlConnector, Provisioning, StaticFeed};

/// Arguments for the provision command
#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    /// Seed from a local CSV file instead of the configured download URL
    #[arg(long, value_name = "PATH")]
    pub feed_file: Option<PathBuf>,
}

/// Check, create if absent, load if empty
pub async fn run_provision(args: ProvisionArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;

    let outcome = match args.feed_file {
        Some(path) => {
            let connector = MySqlConnector::from_config(&config);
            let feed = StaticFeed::from_path(&path)?;
            provision_once(&connector, &feed, &config.table).await
        }
        None => {
            let (connector, feed) = super::connect(&config)?;
            provision_once(&connector, &feed, &config.table).await
        }
    }
    .context("provisioning failed")?;

    println!("{}", describe(&outcome));
    Ok(())
}

fn describe(outcome: &Provisioning) -> String {
    match outcome {
        Provisioning::Ready { rows } => format!("Table already populated ({} rows)", rows),
        Provisioning::Created(summary) => format!("Created table. {}", summary),
        Provisioning::Repopulated(summary) => format!("Repopulated empty table. {}", summary),
    }
}
