//! `/api/patients`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::extract::{ResourceId, ValidJson, ValidQuery};
use crate::params::SearchQuery;
use crate::state::AppState;
use api_shared::{DropdownOption, RouteGroup};
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use his_core::models::{Patient, PatientFilter, PatientRequest};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route("/patients/dropdown-list", get(patient_dropdown))
        .route("/patients/uhid/:uhid", get(get_patient_by_uhid))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        );
    guarded(routes, state, RouteGroup::Patients)
}

#[utoipa::path(
    get,
    path = "/api/patients",
    tag = "patients",
    params(PageRequest, PatientFilter),
    responses((status = 200, description = "One page of patients, newest first", body = [Patient]))
)]
/// List patients, optionally searching name, UHID and mobile.
#[axum::debug_handler]
pub(crate) async fn list_patients(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<PatientFilter>,
) -> ApiResult<Paginated<Patient>> {
    let patients = state.services.patients.list(&filter, &page).await?;
    ok("Patients fetched successfully", patients)
}

#[utoipa::path(
    post,
    path = "/api/patients",
    tag = "patients",
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient registered with a new UHID", body = Patient),
        (status = 400, description = "Invalid request")
    )
)]
/// Register a patient.
///
/// The UHID is generated from the per-day counter, so two registrations on the same day always
/// get distinct, increasing codes.
#[axum::debug_handler]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<PatientRequest>,
) -> Created<Patient> {
    let patient = state.services.patients.create(req).await?;
    created("Patient created successfully", patient)
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Patient> {
    let patient = state.services.patients.get(id).await?;
    ok("Patient fetched successfully", patient)
}

#[utoipa::path(
    get,
    path = "/api/patients/uhid/{uhid}",
    tag = "patients",
    params(("uhid" = String, Path, description = "UHID, e.g. UHID202610160001")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_patient_by_uhid(
    State(state): State<AppState>,
    Path(uhid): Path<String>,
) -> ApiResult<Patient> {
    let patient = state.services.patients.get_by_uhid(&uhid).await?;
    ok("Patient fetched successfully", patient)
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = PatientRequest,
    responses(
        (status = 200, description = "Updated patient", body = Patient),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_patient(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<PatientRequest>,
) -> ApiResult<Patient> {
    let patient = state.services.patients.update(id, req).await?;
    ok("Patient updated successfully", patient)
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted"),
        (status = 400, description = "Patient is currently admitted"),
        (status = 404, description = "Patient not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_patient(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.patients.delete(id).await?;
    done("Patient deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/patients/dropdown-list",
    tag = "patients",
    params(SearchQuery),
    responses((status = 200, description = "Picker options", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn patient_dropdown(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> ApiResult<Vec<DropdownOption>> {
    let options = state.services.patients.dropdown(query.search.as_deref()).await?;
    ok("Patients fetched successfully", options)
}
