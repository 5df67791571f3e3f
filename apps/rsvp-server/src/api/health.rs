// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "UP" while the process is serving requests.
    pub status: String,
    pub message: String,
}

/// Readiness response with the store check result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "UP" or "DOWN".
    pub status: String,
    /// "ok" or "unavailable".
    pub store: String,
}

/// Liveness check handler.
///
/// Always returns 200 if the process is running.
/// Does not check dependencies - use readiness for that.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check handler.
///
/// Returns 200 only if the store answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Store is unavailable", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    match state.store.health_check() {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "UP".to_string(),
                store: "ok".to_string(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "DOWN".to_string(),
                    store: "unavailable".to_string(),
                }),
            )
        }
    }
}
