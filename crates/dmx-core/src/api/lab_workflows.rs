// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `/api/labworkflows` handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::{ApiError, SharedState, created_json, ok_json};
use crate::models::LabWorkflow;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/labworkflows", post(create_lab_workflow))
        .route("/labworkflows/{id}", get(get_lab_workflow))
}

async fn create_lab_workflow(
    State(state): State<SharedState>,
    ApiJson(lab_workflow): ApiJson<LabWorkflow>,
) -> Result<(StatusCode, Json<LabWorkflow>), ApiError> {
    created_json(state.lab_workflows.add_lab_workflow(lab_workflow).await)
}

async fn get_lab_workflow(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LabWorkflow>, ApiError> {
    ok_json(state.lab_workflows.retrieve_lab_workflow_by_id(id).await)
}
