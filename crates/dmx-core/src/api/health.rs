// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Liveness endpoint.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use super::SharedState;

/// Health report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub fn routes() -> Router<SharedState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match state.storage.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    let (status, label) = if database_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database: if database_ok { "ok" } else { "unavailable" },
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.started_at.elapsed().as_secs(),
        }),
    )
}
