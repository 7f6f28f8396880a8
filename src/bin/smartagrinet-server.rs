// ABOUTME: SmartAgriNet backend server binary
// ABOUTME: Loads configuration, builds shared resources, and runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! SmartAgriNet backend server entry point

use clap::Parser;

use smartagrinet::config::ServerConfig;
use smartagrinet::context::ServerResources;
use smartagrinet::logging::init_logging;
use smartagrinet::server;

/// SmartAgriNet backend server
#[derive(Debug, Parser)]
#[command(name = "smartagrinet-server", about = "SmartAgriNet backend server")]
struct Args {
    /// Override the HTTP listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the document store URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    let resources = ServerResources::initialize(config).await?;
    server::serve(resources).await?;
    Ok(())
}
