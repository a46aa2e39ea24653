//! `/api/prescriptions` and `/api/examinations`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::error::ApiError;
use crate::extract::{Pdf, ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use his_core::models::{
    Examination, ExaminationRequest, PrescriptionFilter, PrescriptionRequest, PrescriptionView,
};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/prescriptions", get(list_prescriptions).post(create_prescription))
        .route("/prescriptions/visit/:id", get(prescription_for_visit))
        .route(
            "/prescriptions/:id",
            get(get_prescription)
                .put(update_prescription)
                .delete(delete_prescription),
        )
        .route("/prescriptions/:id/pdf", get(prescription_pdf))
        .route("/examinations", post(save_examination))
        .route("/examinations/visit/:id", get(examination_for_visit))
        .route("/examinations/:id", get(get_examination));
    guarded(routes, state, RouteGroup::Clinical)
}

// ============================================================================
// PRESCRIPTIONS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/prescriptions",
    tag = "clinical",
    params(PageRequest, PrescriptionFilter),
    responses((status = 200, description = "One page of prescriptions", body = [PrescriptionView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_prescriptions(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<PrescriptionFilter>,
) -> ApiResult<Paginated<PrescriptionView>> {
    let prescriptions = state
        .services
        .clinical
        .list_prescriptions(&filter, &page)
        .await?;
    ok("Prescriptions fetched successfully", prescriptions)
}

#[utoipa::path(
    post,
    path = "/api/prescriptions",
    tag = "clinical",
    request_body = PrescriptionRequest,
    responses(
        (status = 201, description = "Prescription written and visit closed", body = PrescriptionView),
        (status = 400, description = "Visit is closed or already has a prescription"),
        (status = 404, description = "Visit not found")
    )
)]
/// Write the prescription for a visit. The visit is closed in the same write.
#[axum::debug_handler]
pub(crate) async fn create_prescription(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<PrescriptionRequest>,
) -> Created<PrescriptionView> {
    let prescription = state.services.clinical.create_prescription(req).await?;
    created("Prescription created successfully", prescription)
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/{id}",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription", body = PrescriptionView),
        (status = 404, description = "Prescription not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_prescription(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<PrescriptionView> {
    let prescription = state.services.clinical.get_prescription(id).await?;
    ok("Prescription fetched successfully", prescription)
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/visit/{id}",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Prescription of the visit", body = PrescriptionView),
        (status = 404, description = "Prescription not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn prescription_for_visit(
    State(state): State<AppState>,
    ResourceId(visit_id): ResourceId,
) -> ApiResult<PrescriptionView> {
    let prescription = state.services.clinical.prescription_for_visit(visit_id).await?;
    ok("Prescription fetched successfully", prescription)
}

#[utoipa::path(
    put,
    path = "/api/prescriptions/{id}",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Prescription id")),
    request_body = PrescriptionRequest,
    responses(
        (status = 200, description = "Updated prescription", body = PrescriptionView),
        (status = 400, description = "visitId cannot change"),
        (status = 404, description = "Prescription not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_prescription(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<PrescriptionRequest>,
) -> ApiResult<PrescriptionView> {
    let prescription = state.services.clinical.update_prescription(id, req).await?;
    ok("Prescription updated successfully", prescription)
}

#[utoipa::path(
    delete,
    path = "/api/prescriptions/{id}",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription deleted"),
        (status = 404, description = "Prescription not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_prescription(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.clinical.delete_prescription(id).await?;
    done("Prescription deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/{id}/pdf",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Printable prescription", content_type = "application/pdf"),
        (status = 404, description = "Prescription not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn prescription_pdf(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Pdf, ApiError> {
    Ok(Pdf::inline(state.services.clinical.prescription_pdf(id).await?))
}

// ============================================================================
// EXAMINATIONS
// ============================================================================

#[utoipa::path(
    post,
    path = "/api/examinations",
    tag = "clinical",
    request_body = ExaminationRequest,
    responses(
        (status = 200, description = "Examination saved for the visit", body = Examination),
        (status = 404, description = "Visit not found")
    )
)]
/// Record the examination for a visit, replacing any earlier one.
#[axum::debug_handler]
pub(crate) async fn save_examination(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ExaminationRequest>,
) -> ApiResult<Examination> {
    let examination = state.services.clinical.save_examination(req).await?;
    ok("Examination saved successfully", examination)
}

#[utoipa::path(
    get,
    path = "/api/examinations/{id}",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Examination id")),
    responses(
        (status = 200, description = "Examination", body = Examination),
        (status = 404, description = "Examination not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_examination(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Examination> {
    let examination = state.services.clinical.get_examination(id).await?;
    ok("Examination fetched successfully", examination)
}

#[utoipa::path(
    get,
    path = "/api/examinations/visit/{id}",
    tag = "clinical",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Examination of the visit", body = Examination),
        (status = 404, description = "Examination not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn examination_for_visit(
    State(state): State<AppState>,
    ResourceId(visit_id): ResourceId,
) -> ApiResult<Examination> {
    let examination = state.services.clinical.examination_for_visit(visit_id).await?;
    ok("Examination fetched successfully", examination)
}
