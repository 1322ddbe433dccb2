//! Command implementations for the reslookup CLI

pub mod admin;
pub mod lookup;
pub mod provision;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use reslookup_core::config::TomlParameters;
use reslookup_core::{HttpFeed, MySqlConnector, ServiceConfig};

pub use admin::run_admin;
pub use lookup::run_lookup;
pub use provision::run_provision;
pub use serve::run_serve;

/// Resolve the service configuration from a TOML file when given, else
/// from the environment (after `.env` loading).
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let config = match path {
        Some(path) => {
            let source = TomlParameters::from_path(path)?;
            ServiceConfig::resolve(&source)
        }
        None => ServiceConfig::from_env(),
    }
    .context("failed to resolve service configuration")?;

    tracing::debug!(config = ?config, "configuration resolved");
    Ok(config)
}

/// Store connector and HTTP feed built from `config`.
pub fn connect(config: &ServiceConfig) -> Result<(MySqlConnector, HttpFeed)> {
    let connector = MySqlConnector::from_config(config);
    let feed = HttpFeed::new(&config.download_url, config.feed_timeout)
        .context("failed to set up feed client")?;
    Ok((connector, feed))
}
