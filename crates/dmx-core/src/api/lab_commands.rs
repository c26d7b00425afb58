// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `/api/labcommands` handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::{ApiError, SharedState, created_json, ok_json};
use crate::models::LabCommand;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/labcommands",
            get(list_lab_commands)
                .post(create_lab_command)
                .put(update_lab_command),
        )
        .route("/labcommands/{id}", get(get_lab_command))
}

async fn create_lab_command(
    State(state): State<SharedState>,
    ApiJson(lab_command): ApiJson<LabCommand>,
) -> Result<(StatusCode, Json<LabCommand>), ApiError> {
    created_json(state.lab_commands.add_lab_command(lab_command).await)
}

async fn list_lab_commands(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LabCommand>>, ApiError> {
    ok_json(state.lab_commands.retrieve_all_lab_commands().await)
}

async fn get_lab_command(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LabCommand>, ApiError> {
    ok_json(state.lab_commands.retrieve_lab_command_by_id(id).await)
}

async fn update_lab_command(
    State(state): State<SharedState>,
    ApiJson(lab_command): ApiJson<LabCommand>,
) -> Result<Json<LabCommand>, ApiError> {
    ok_json(state.lab_commands.modify_lab_command(lab_command).await)
}
