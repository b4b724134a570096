// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

use crate::state::AppState;

/// A sweep older than this many intervals marks the service degraded.
const STALE_INTERVALS: u32 = 3;

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall readiness status ("ok", "pending" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// When the most recent sweep finished, if one has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sweep_finished_at: Option<DateTime<Utc>>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness of the sweep pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepFreshness {
    /// A sweep finished recently.
    Fresh,
    /// No sweep has completed yet (normal right after startup).
    Pending,
    /// The last sweep is older than [`STALE_INTERVALS`] intervals.
    Stale,
}

impl SweepFreshness {
    fn as_status(self) -> &'static str {
        match self {
            SweepFreshness::Fresh => "ok",
            SweepFreshness::Pending => "pending",
            SweepFreshness::Stale => "degraded",
        }
    }
}

fn sweep_freshness(
    last_finished: Option<DateTime<Utc>>,
    interval: Duration,
    now: DateTime<Utc>,
) -> SweepFreshness {
    match last_finished {
        None => SweepFreshness::Pending,
        Some(finished_at) => {
            let age = now.signed_duration_since(finished_at);
            let limit = interval * STALE_INTERVALS;
            if age.to_std().map_or(true, |age| age <= limit) {
                SweepFreshness::Fresh
            } else {
                SweepFreshness::Stale
            }
        }
    }
}

/// Liveness probe handler.
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
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 200 only once a sweep has completed recently; 503 before the
/// first sweep finishes or once the last one went stale.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let last_finished = state
        .service
        .last_report()
        .await
        .map(|report| report.finished_at);

    let freshness = sweep_freshness(last_finished, state.sync_interval, Utc::now());

    let response = ReadyResponse {
        status: freshness.as_status().to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            last_sweep_finished_at: last_finished,
        },
    };

    let status = if freshness == SweepFreshness::Fresh {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn freshness_pending_before_first_sweep() {
        let freshness = sweep_freshness(None, Duration::from_secs(600), at(12, 0));
        assert_eq!(freshness, SweepFreshness::Pending);
    }

    #[test]
    fn freshness_ok_within_three_intervals() {
        let freshness = sweep_freshness(
            Some(at(11, 45)),
            Duration::from_secs(600),
            at(12, 0),
        );
        assert_eq!(freshness, SweepFreshness::Fresh);
    }

    #[test]
    fn freshness_stale_after_three_intervals() {
        let freshness = sweep_freshness(
            Some(at(11, 0)),
            Duration::from_secs(600),
            at(12, 0),
        );
        assert_eq!(freshness, SweepFreshness::Stale);
    }

    #[tokio::test]
    async fn health_always_ok() {
        let response = health().await;
        assert_eq!(response.0.status, "ok");
    }

    #[tokio::test]
    async fn readiness_is_unavailable_before_first_sweep() {
        let state = crate::api::tests::test_state();
        let (status, body) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.0.status, "pending");
        assert!(body.0.checks.last_sweep_finished_at.is_none());
    }
}
