//! `/api/visits`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::extract::{ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use his_core::models::{Visit, VisitFilter, VisitRequest, VisitView};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/visits", get(list_visits).post(create_visit))
        .route(
            "/visits/:id",
            get(get_visit).put(update_visit).delete(delete_visit),
        );
    guarded(routes, state, RouteGroup::Visits)
}

#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "visits",
    params(PageRequest, VisitFilter),
    responses((status = 200, description = "One page of visits with patient and doctor", body = [VisitView]))
)]
/// List visits. `from` and `to` are inclusive local calendar days.
#[axum::debug_handler]
pub(crate) async fn list_visits(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<VisitFilter>,
) -> ApiResult<Paginated<VisitView>> {
    let visits = state.services.visits.list(&filter, &page).await?;
    ok("Visits fetched successfully", visits)
}

#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "visits",
    request_body = VisitRequest,
    responses(
        (status = 201, description = "Visit created with a new visit code", body = Visit),
        (status = 404, description = "Patient or doctor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_visit(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<VisitRequest>,
) -> Created<Visit> {
    let visit = state.services.visits.create(req).await?;
    created("Visit created successfully", visit)
}

#[utoipa::path(
    get,
    path = "/api/visits/{id}",
    tag = "visits",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit with patient and doctor", body = VisitView),
        (status = 404, description = "Visit not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_visit(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<VisitView> {
    let visit = state.services.visits.get(id).await?;
    ok("Visit fetched successfully", visit)
}

#[utoipa::path(
    put,
    path = "/api/visits/{id}",
    tag = "visits",
    params(("id" = Uuid, Path, description = "Visit id")),
    request_body = VisitRequest,
    responses(
        (status = 200, description = "Updated visit", body = Visit),
        (status = 404, description = "Visit not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_visit(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<VisitRequest>,
) -> ApiResult<Visit> {
    let visit = state.services.visits.update(id, req).await?;
    ok("Visit updated successfully", visit)
}

#[utoipa::path(
    delete,
    path = "/api/visits/{id}",
    tag = "visits",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit deleted"),
        (status = 400, description = "Visit already has a prescription"),
        (status = 404, description = "Visit not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_visit(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.visits.delete(id).await?;
    done("Visit deleted successfully")
}
