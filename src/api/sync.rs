// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use tracing::info;

use crate::error::ApiError;
use crate::models::SweepReport;
use crate::service::DispatchError;
use crate::state::AppState;

/// Manual dispatch: run a sweep now.
///
/// Runs inline and returns the report. Rejected with 409 when a sweep
/// (scheduled or manual) is already in flight.
#[utoipa::path(
    post,
    path = "/v1/sync/run",
    tag = "Sync",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
        (status = 409, description = "A sweep is already running"),
        (status = 500, description = "Sweep failed")
    )
)]
pub async fn run_sync(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    info!("Manual sweep dispatched");
    match state.service.try_run_sweep().await {
        Ok(report) => Ok(Json(report)),
        Err(DispatchError::Busy) => Err(ApiError::conflict("a sweep is already running")),
        Err(DispatchError::Sync(e)) => Err(ApiError::internal(e.to_string())),
    }
}

/// Report of the most recent completed sweep.
#[utoipa::path(
    get,
    path = "/v1/sync/status",
    tag = "Sync",
    responses(
        (status = 200, description = "Last sweep report", body = SweepReport),
        (status = 404, description = "No sweep has completed yet")
    )
)]
pub async fn sync_status(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    match state.service.last_report().await {
        Some(report) => Ok(Json(report)),
        None => Err(ApiError::not_found("no sweep has completed yet")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn status_is_not_found_before_first_sweep() {
        let state = crate::api::tests::test_state();
        let err = sync_status(State(state)).await.err().unwrap();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
