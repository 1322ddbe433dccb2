//! HTTP server command
//!
//! Runs the lookup endpoint against the configured MySQL store and feed.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use reslookup_server::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,
}

/// Run the HTTP server (blocks until shutdown)
pub async fn run_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (connector, feed) = super::connect(&config)?;

    let state = AppState::new(connector, feed, config.table.clone());
    let server_config = ServerConfig {
        bind_addr: args.bind,
    };

    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
