// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process startup: connect, migrate, wire brokers and serve.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api::{self, AppState};
use crate::brokers::{HttpLabApiBroker, PostgresStorageBroker, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::migrations;

/// Run the API until `shutdown` resolves.
pub async fn serve(config: Config, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    migrations::run(&pool).await?;

    info!("Database migrations applied");

    let lab_api = HttpLabApiBroker::new(&config.lab_api)?;
    let state = Arc::new(AppState::new(
        Arc::new(PostgresStorageBroker::new(pool.clone())),
        Arc::new(lab_api),
        Arc::new(SystemClock),
        config.lab_api.service_information(),
    ));

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "DMX Core listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    pool.close().await;
    info!("DMX Core shut down");

    Ok(())
}
