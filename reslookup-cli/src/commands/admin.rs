//! Operator commands against the backing table

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use reslookup_core::{admin_once, AdminCommand, CommandOutcome};

/// Arguments for the admin command
#[derive(Parser, Debug)]
pub struct AdminArgs {
    /// Operation to run
    #[arg(value_enum)]
    pub action: AdminAction,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    /// Drop the table entirely
    Droptable,
    /// Delete every row, keep the table
    Deletetable,
    /// Load the feed into the existing table
    Inserttable,
}

impl From<AdminAction> for AdminCommand {
    fn from(action: AdminAction) -> Self {
        match action {
            AdminAction::Droptable => AdminCommand::DropTable,
            AdminAction::Deletetable => AdminCommand::DeleteTable,
            AdminAction::Inserttable => AdminCommand::InsertTable,
        }
    }
}

pub async fn run_admin(args: AdminArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (connector, feed) = super::connect(&config)?;
    let command = AdminCommand::from(args.action);

    let outcome = admin_once(&connector, &feed, &config.table, command)
        .await
        .with_context(|| format!("{} failed", command))?;

    match outcome {
        CommandOutcome::Dropped => println!("Dropped table {}", config.table),
        CommandOutcome::Deleted { rows } => {
            println!("Deleted {} rows from {}", rows, config.table)
        }
        CommandOutcome::Inserted(summary) => println!("{}", summary),
    }
    Ok(())
}
