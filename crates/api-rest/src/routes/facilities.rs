//! `/api/floors`, `/api/wards` and `/api/beds`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::extract::{ResourceId, ValidJson, ValidQuery};
use crate::params::WardQuery;
use crate::state::AppState;
use api_shared::{DropdownOption, RouteGroup};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use his_core::models::{
    Bed, BedFilter, BedRequest, BedView, Floor, FloorRequest, Ward, WardFilter, WardRequest,
};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/floors", get(list_floors).post(create_floor))
        .route("/floors/dropdown-list", get(floor_dropdown))
        .route(
            "/floors/:id",
            get(get_floor).put(update_floor).delete(delete_floor),
        )
        .route("/wards", get(list_wards).post(create_ward))
        .route("/wards/dropdown-list", get(ward_dropdown))
        .route(
            "/wards/:id",
            get(get_ward).put(update_ward).delete(delete_ward),
        )
        .route("/beds", get(list_beds).post(create_bed))
        .route("/beds/dropdown-list", get(available_bed_dropdown))
        .route("/beds/:id", get(get_bed).put(update_bed).delete(delete_bed));
    guarded(routes, state, RouteGroup::Facilities)
}

// ============================================================================
// FLOORS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/floors",
    tag = "facilities",
    params(PageRequest),
    responses((status = 200, description = "One page of floors", body = [Floor]))
)]
#[axum::debug_handler]
pub(crate) async fn list_floors(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
) -> ApiResult<Paginated<Floor>> {
    let floors = state.services.facilities.list_floors(&page).await?;
    ok("Floors fetched successfully", floors)
}

#[utoipa::path(
    post,
    path = "/api/floors",
    tag = "facilities",
    request_body = FloorRequest,
    responses(
        (status = 201, description = "Floor created", body = Floor),
        (status = 400, description = "Invalid request or floor number in use")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_floor(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<FloorRequest>,
) -> Created<Floor> {
    let floor = state.services.facilities.create_floor(req).await?;
    created("Floor created successfully", floor)
}

#[utoipa::path(
    get,
    path = "/api/floors/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Floor id")),
    responses(
        (status = 200, description = "Floor", body = Floor),
        (status = 404, description = "Floor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_floor(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Floor> {
    let floor = state.services.facilities.get_floor(id).await?;
    ok("Floor fetched successfully", floor)
}

#[utoipa::path(
    put,
    path = "/api/floors/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Floor id")),
    request_body = FloorRequest,
    responses(
        (status = 200, description = "Updated floor", body = Floor),
        (status = 404, description = "Floor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_floor(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<FloorRequest>,
) -> ApiResult<Floor> {
    let floor = state.services.facilities.update_floor(id, req).await?;
    ok("Floor updated successfully", floor)
}

#[utoipa::path(
    delete,
    path = "/api/floors/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Floor id")),
    responses(
        (status = 200, description = "Floor deleted"),
        (status = 400, description = "Floor still has wards"),
        (status = 404, description = "Floor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_floor(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.facilities.delete_floor(id).await?;
    done("Floor deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/floors/dropdown-list",
    tag = "facilities",
    responses((status = 200, description = "Picker options", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn floor_dropdown(State(state): State<AppState>) -> ApiResult<Vec<DropdownOption>> {
    let options = state.services.facilities.floor_dropdown().await?;
    ok("Floors fetched successfully", options)
}

// ============================================================================
// WARDS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/wards",
    tag = "facilities",
    params(PageRequest, WardFilter),
    responses((status = 200, description = "One page of wards", body = [Ward]))
)]
#[axum::debug_handler]
pub(crate) async fn list_wards(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<WardFilter>,
) -> ApiResult<Paginated<Ward>> {
    let wards = state.services.facilities.list_wards(&filter, &page).await?;
    ok("Wards fetched successfully", wards)
}

#[utoipa::path(
    post,
    path = "/api/wards",
    tag = "facilities",
    request_body = WardRequest,
    responses(
        (status = 201, description = "Ward created", body = Ward),
        (status = 404, description = "Floor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_ward(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<WardRequest>,
) -> Created<Ward> {
    let ward = state.services.facilities.create_ward(req).await?;
    created("Ward created successfully", ward)
}

#[utoipa::path(
    get,
    path = "/api/wards/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Ward id")),
    responses(
        (status = 200, description = "Ward", body = Ward),
        (status = 404, description = "Ward not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_ward(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Ward> {
    let ward = state.services.facilities.get_ward(id).await?;
    ok("Ward fetched successfully", ward)
}

#[utoipa::path(
    put,
    path = "/api/wards/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Ward id")),
    request_body = WardRequest,
    responses(
        (status = 200, description = "Updated ward", body = Ward),
        (status = 404, description = "Ward or floor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_ward(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<WardRequest>,
) -> ApiResult<Ward> {
    let ward = state.services.facilities.update_ward(id, req).await?;
    ok("Ward updated successfully", ward)
}

#[utoipa::path(
    delete,
    path = "/api/wards/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Ward id")),
    responses(
        (status = 200, description = "Ward deleted"),
        (status = 400, description = "Ward still has beds"),
        (status = 404, description = "Ward not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_ward(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.facilities.delete_ward(id).await?;
    done("Ward deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/wards/dropdown-list",
    tag = "facilities",
    params(WardFilter),
    responses((status = 200, description = "Picker options", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn ward_dropdown(
    State(state): State<AppState>,
    ValidQuery(filter): ValidQuery<WardFilter>,
) -> ApiResult<Vec<DropdownOption>> {
    let options = state.services.facilities.ward_dropdown(filter.floor_id).await?;
    ok("Wards fetched successfully", options)
}

// ============================================================================
// BEDS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/beds",
    tag = "facilities",
    params(PageRequest, BedFilter),
    responses((status = 200, description = "One page of beds with their ward", body = [BedView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_beds(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<BedFilter>,
) -> ApiResult<Paginated<BedView>> {
    let beds = state.services.facilities.list_beds(&filter, &page).await?;
    ok("Beds fetched successfully", beds)
}

#[utoipa::path(
    post,
    path = "/api/beds",
    tag = "facilities",
    request_body = BedRequest,
    responses(
        (status = 201, description = "Bed created", body = Bed),
        (status = 400, description = "Invalid request or bed number taken in the ward"),
        (status = 404, description = "Ward not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_bed(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<BedRequest>,
) -> Created<Bed> {
    let bed = state.services.facilities.create_bed(req).await?;
    created("Bed created successfully", bed)
}

#[utoipa::path(
    get,
    path = "/api/beds/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Bed id")),
    responses(
        (status = 200, description = "Bed with ward and occupant", body = BedView),
        (status = 404, description = "Bed not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_bed(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<BedView> {
    let bed = state.services.facilities.get_bed(id).await?;
    ok("Bed fetched successfully", bed)
}

#[utoipa::path(
    put,
    path = "/api/beds/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Bed id")),
    request_body = BedRequest,
    responses(
        (status = 200, description = "Updated bed", body = Bed),
        (status = 400, description = "Bed is occupied"),
        (status = 404, description = "Bed not found")
    )
)]
/// Update a bed. Occupancy is owned by admission and discharge, so an occupied bed keeps its
/// status and ward here.
#[axum::debug_handler]
pub(crate) async fn update_bed(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<BedRequest>,
) -> ApiResult<Bed> {
    let bed = state.services.facilities.update_bed(id, req).await?;
    ok("Bed updated successfully", bed)
}

#[utoipa::path(
    delete,
    path = "/api/beds/{id}",
    tag = "facilities",
    params(("id" = Uuid, Path, description = "Bed id")),
    responses(
        (status = 200, description = "Bed deleted"),
        (status = 400, description = "Bed is occupied"),
        (status = 404, description = "Bed not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_bed(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.facilities.delete_bed(id).await?;
    done("Bed deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/beds/dropdown-list",
    tag = "facilities",
    params(WardQuery),
    responses((status = 200, description = "Available beds as picker options", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn available_bed_dropdown(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<WardQuery>,
) -> ApiResult<Vec<DropdownOption>> {
    let options = state
        .services
        .facilities
        .available_bed_dropdown(query.ward_id)
        .await?;
    ok("Available beds fetched successfully", options)
}
