// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP API.
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | POST | `/api/labs` | 201 |
//! | GET | `/api/labs` | 200 |
//! | GET | `/api/labs/{id}` | 200 |
//! | DELETE | `/api/labs/{id}` | 200 |
//! | POST | `/api/labcommands` | 201 |
//! | GET | `/api/labcommands` | 200 |
//! | GET | `/api/labcommands/{id}` | 200 |
//! | PUT | `/api/labcommands` | 200 |
//! | POST | `/api/labworkflows` | 201 |
//! | GET | `/api/labworkflows/{id}` | 200 |
//! | GET | `/health` | 200 / 503 |
//!
//! Failures are returned as `{"error": {"code", "message", "data"?}}`.

pub mod extract;
pub mod health;
pub mod lab_commands;
pub mod lab_workflows;
pub mod labs;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::brokers::{DateTimeBroker, LabApiBroker, StorageBroker};
use crate::models::ExternalLabServiceInformation;
use crate::services::{
    ErrorKind, ExternalLabService, InvalidFields, LabCommandService, LabOrchestrationService,
    LabService, LabWorkflowCommandService, LabWorkflowOrchestrationService, LabWorkflowService,
    ServiceError,
};

/// Services shared by every handler.
pub struct AppState {
    pub labs: LabOrchestrationService,
    pub lab_commands: LabCommandService,
    pub lab_workflows: LabWorkflowOrchestrationService,
    pub storage: Arc<dyn StorageBroker>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service over the given brokers.
    pub fn new(
        storage: Arc<dyn StorageBroker>,
        lab_api: Arc<dyn LabApiBroker>,
        clock: Arc<dyn DateTimeBroker>,
        service_information: ExternalLabServiceInformation,
    ) -> Self {
        Self {
            labs: LabOrchestrationService::new(
                LabService::new(storage.clone(), clock.clone()),
                ExternalLabService::new(lab_api, service_information),
            ),
            lab_commands: LabCommandService::new(storage.clone(), clock.clone()),
            lab_workflows: LabWorkflowOrchestrationService::new(
                LabWorkflowService::new(storage.clone(), clock.clone()),
                LabWorkflowCommandService::new(storage.clone(), clock),
            ),
            storage,
            started_at: Instant::now(),
        }
    }
}

/// Shared application state.
pub type SharedState = Arc<AppState>;

/// Build the API router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(health::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        .merge(labs::routes())
        .merge(lab_commands::routes())
        .merge(lab_workflows::routes())
}

/// Standard API error response body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InvalidFields>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({ "error": self }));
        (status, body).into_response()
    }
}

/// Status code for the original reason of a service error.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Invalid | ErrorKind::InvalidReference => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Locked => StatusCode::LOCKED,
        ErrorKind::Dependency | ErrorKind::Service => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = status_for(err.kind());
        let message = if status.is_server_error() {
            // Internal causes stay in the logs.
            err.to_string()
        } else {
            err.detail()
        };

        ApiError {
            code: status.as_u16(),
            message,
            data: err.invalid_fields().cloned(),
        }
    }
}

/// Wrap a service result into a JSON response.
pub(crate) fn ok_json<T: Serialize>(result: Result<T, ServiceError>) -> Result<Json<T>, ApiError> {
    result.map(Json).map_err(ApiError::from)
}

/// Wrap a service result into a `201 Created` JSON response.
pub(crate) fn created_json<T: Serialize>(
    result: Result<T, ServiceError>,
) -> Result<(StatusCode, Json<T>), ApiError> {
    result
        .map(|value| (StatusCode::CREATED, Json(value)))
        .map_err(ApiError::from)
}
