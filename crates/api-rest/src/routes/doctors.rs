//! `/api/doctors`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::extract::{ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::{DropdownOption, RouteGroup};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use his_core::models::{Doctor, DoctorFilter, DoctorRequest};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/dropdown-list", get(doctor_dropdown))
        .route(
            "/doctors/:id",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        );
    guarded(routes, state, RouteGroup::Doctors)
}

#[utoipa::path(
    get,
    path = "/api/doctors",
    tag = "doctors",
    params(PageRequest, DoctorFilter),
    responses((status = 200, description = "One page of doctors", body = [Doctor]))
)]
#[axum::debug_handler]
pub(crate) async fn list_doctors(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<DoctorFilter>,
) -> ApiResult<Paginated<Doctor>> {
    let doctors = state.services.doctors.list(&filter, &page).await?;
    ok("Doctors fetched successfully", doctors)
}

#[utoipa::path(
    post,
    path = "/api/doctors",
    tag = "doctors",
    request_body = DoctorRequest,
    responses(
        (status = 201, description = "Doctor and linked login created", body = Doctor),
        (status = 400, description = "Invalid request, or email or licence number already in use")
    )
)]
/// Create a doctor together with the login they sign in with.
#[axum::debug_handler]
pub(crate) async fn create_doctor(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<DoctorRequest>,
) -> Created<Doctor> {
    let doctor = state.services.doctors.create(req).await?;
    created("Doctor created successfully", doctor)
}

#[utoipa::path(
    get,
    path = "/api/doctors/{id}",
    tag = "doctors",
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Doctor", body = Doctor),
        (status = 404, description = "Doctor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_doctor(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Doctor> {
    let doctor = state.services.doctors.get(id).await?;
    ok("Doctor fetched successfully", doctor)
}

#[utoipa::path(
    put,
    path = "/api/doctors/{id}",
    tag = "doctors",
    params(("id" = Uuid, Path, description = "Doctor id")),
    request_body = DoctorRequest,
    responses(
        (status = 200, description = "Updated doctor", body = Doctor),
        (status = 404, description = "Doctor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_doctor(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<DoctorRequest>,
) -> ApiResult<Doctor> {
    let doctor = state.services.doctors.update(id, req).await?;
    ok("Doctor updated successfully", doctor)
}

#[utoipa::path(
    delete,
    path = "/api/doctors/{id}",
    tag = "doctors",
    params(("id" = Uuid, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Doctor deleted and login deactivated"),
        (status = 404, description = "Doctor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_doctor(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.doctors.delete(id).await?;
    done("Doctor deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/doctors/dropdown-list",
    tag = "doctors",
    responses((status = 200, description = "Active doctors as picker options", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn doctor_dropdown(State(state): State<AppState>) -> ApiResult<Vec<DropdownOption>> {
    let options = state.services.doctors.dropdown().await?;
    ok("Doctors fetched successfully", options)
}
