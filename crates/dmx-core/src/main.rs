// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! DMX Core - Hardware Lab Management Server
//!
//! An HTTP server responsible for:
//! - Lab inventory, reconciled against the lab-management API
//! - Lab commands and their status
//! - Lab workflows and their commands

use tracing::{info, warn};

use dmx_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dmx_core=info,tower_http=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env()?;

    info!(
        http_addr = %config.http_addr,
        lab_api_url = %config.lab_api.url,
        service_id = %config.lab_api.service_id,
        "Starting DMX Core"
    );

    dmx_core::server::serve(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}
