// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `/api/labs` handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::{ApiError, SharedState, created_json, ok_json};
use crate::models::Lab;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/labs", get(list_labs).post(create_lab))
        .route("/labs/{id}", get(get_lab).delete(delete_lab))
}

async fn create_lab(
    State(state): State<SharedState>,
    ApiJson(lab): ApiJson<Lab>,
) -> Result<(StatusCode, Json<Lab>), ApiError> {
    created_json(state.labs.add_lab(lab).await)
}

async fn list_labs(State(state): State<SharedState>) -> Result<Json<Vec<Lab>>, ApiError> {
    ok_json(state.labs.retrieve_all_labs().await)
}

async fn get_lab(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Lab>, ApiError> {
    ok_json(state.labs.retrieve_lab_by_id(id).await)
}

async fn delete_lab(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Lab>, ApiError> {
    ok_json(state.labs.remove_lab_by_id(id).await)
}
