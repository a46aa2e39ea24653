//! `/api/ipd`: admissions, transfers and discharge.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::error::ApiError;
use crate::extract::{Pdf, ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use his_core::models::{IpdAdmitRequest, IpdFilter, IpdUpdateRequest, IpdView};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/ipd", get(list_admissions).post(admit_patient))
        .route(
            "/ipd/:id",
            get(get_admission).put(update_admission).delete(delete_admission),
        )
        .route("/ipd/:id/pdf", get(ipd_bill_pdf));
    guarded(routes, state, RouteGroup::Ipd)
}

#[utoipa::path(
    get,
    path = "/api/ipd",
    tag = "ipd",
    params(PageRequest, IpdFilter),
    responses((status = 200, description = "One page of admissions, latest first", body = [IpdView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_admissions(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<IpdFilter>,
) -> ApiResult<Paginated<IpdView>> {
    let admissions = state.services.ipd.list(&filter, &page).await?;
    ok("IPD records fetched successfully", admissions)
}

#[utoipa::path(
    post,
    path = "/api/ipd",
    tag = "ipd",
    request_body = IpdAdmitRequest,
    responses(
        (status = 201, description = "Patient admitted and bed occupied", body = IpdView),
        (status = 400, description = "Bed not available, patient already admitted, or a service is not billable in IPD"),
        (status = 404, description = "Patient, doctor, bed or service not found")
    )
)]
/// Admit a patient to an available bed.
#[axum::debug_handler]
pub(crate) async fn admit_patient(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<IpdAdmitRequest>,
) -> Created<IpdView> {
    let admission = state.services.ipd.admit(req).await?;
    created("Patient admitted successfully", admission)
}

#[utoipa::path(
    get,
    path = "/api/ipd/{id}",
    tag = "ipd",
    params(("id" = Uuid, Path, description = "IPD record id")),
    responses(
        (status = 200, description = "Admission with patient, doctor and bed", body = IpdView),
        (status = 404, description = "IPD record not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_admission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<IpdView> {
    let admission = state.services.ipd.get(id).await?;
    ok("IPD record fetched successfully", admission)
}

#[utoipa::path(
    put,
    path = "/api/ipd/{id}",
    tag = "ipd",
    params(("id" = Uuid, Path, description = "IPD record id")),
    request_body = IpdUpdateRequest,
    responses(
        (status = 200, description = "Updated admission", body = IpdView),
        (status = 400, description = "Target bed not available, or patient already discharged"),
        (status = 404, description = "IPD record, bed or service not found")
    )
)]
/// Update a running admission.
///
/// One call may add services, move the patient to another bed (charging the old one), and
/// discharge with `patientStatus = "Discharged"`, which charges the current bed and frees it.
#[axum::debug_handler]
pub(crate) async fn update_admission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<IpdUpdateRequest>,
) -> ApiResult<IpdView> {
    let admission = state.services.ipd.update(id, req).await?;
    ok("IPD record updated successfully", admission)
}

#[utoipa::path(
    delete,
    path = "/api/ipd/{id}",
    tag = "ipd",
    params(("id" = Uuid, Path, description = "IPD record id")),
    responses(
        (status = 200, description = "Admission deleted and bed freed"),
        (status = 400, description = "Lab work has already started on this bill"),
        (status = 404, description = "IPD record not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_admission(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.ipd.delete(id).await?;
    done("IPD record deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/ipd/{id}/pdf",
    tag = "ipd",
    params(("id" = Uuid, Path, description = "IPD record id")),
    responses(
        (status = 200, description = "Printable IPD bill", content_type = "application/pdf"),
        (status = 404, description = "IPD record not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn ipd_bill_pdf(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Pdf, ApiError> {
    Ok(Pdf::attachment(state.services.ipd.bill_pdf(id).await?))
}
