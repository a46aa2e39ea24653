//! Liveness and readiness checks. These sit outside `/api` and need no token.

use crate::state::AppState;
use api_shared::{HealthRes, HealthService};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    ),
    security(())
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the HIS REST API service. It never touches the store,
/// so load balancers can poll it cheaply.
#[axum::debug_handler]
pub(crate) async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable", body = HealthRes),
        (status = 503, description = "Store unreachable", body = HealthRes)
    ),
    security(())
)]
/// Readiness check: pings the store.
#[axum::debug_handler]
pub(crate) async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthRes>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthRes {
                ok: true,
                message: "HIS is ready".into(),
            }),
        ),
        Err(e) => {
            tracing::error!("Readiness ping failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthRes {
                    ok: false,
                    message: "Store unavailable".into(),
                }),
            )
        }
    }
}
