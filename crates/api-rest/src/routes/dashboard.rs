//! `/api/dashboard`.

use super::{ok, ApiResult};
use crate::auth::guarded;
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use his_core::services::DashboardStats;

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    guarded(
        Router::new().route("/dashboard/stats", get(dashboard_stats)),
        state,
        RouteGroup::Dashboard,
    )
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "dashboard",
    responses((status = 200, description = "Counts for the front page", body = DashboardStats))
)]
/// Today's registrations, visits, bed occupancy, pending lab work and OPD takings. "Today" is
/// the hospital's local calendar day.
#[axum::debug_handler]
pub(crate) async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.services.dashboard.stats().await?;
    ok("Dashboard stats fetched successfully", stats)
}
