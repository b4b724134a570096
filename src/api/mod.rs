// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{models::SweepReport, state::AppState};

pub mod health;
pub mod sync;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/sync/run", post(sync::run_sync))
        .route("/sync/status", get(sync::sync_status))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::readiness,
        sync::run_sync,
        sync::sync_status
    ),
    components(
        schemas(
            SweepReport,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Sync", description = "Manual sweep dispatch and status")
    )
)]
struct ApiDoc;
