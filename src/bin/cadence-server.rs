// ABOUTME: Main server binary for the Cadence habit tracking API
// ABOUTME: Loads env configuration, applies CLI overrides, runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! # Cadence Server
//!
//! ```bash
//! # Run with environment configuration
//! CADENCE_JWT_SECRET=... cargo run --bin cadence-server
//!
//! # Override the port and database
//! cargo run --bin cadence-server -- --port 9000 --database-url sqlite:./dev.db
//! ```

use clap::Parser;
use tracing::error;

use cadence_api::config::ServerConfig;
use cadence_api::logging;

#[derive(Parser)]
#[command(
    name = "cadence-server",
    about = "Cadence habit tracking API server",
    version
)]
struct Args {
    /// HTTP port override
    #[arg(long)]
    port: Option<u16>,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() {
    logging::init();

    let args = Args::parse();
    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    if let Err(e) = cadence_api::server::run(config).await {
        error!("Server exited with error: {e}");
        std::process::exit(1);
    }
}
