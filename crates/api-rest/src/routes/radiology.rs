//! `/api/radiology-templates` and `/api/radiology-reports`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::error::ApiError;
use crate::extract::{Pdf, ResourceId, ValidJson, ValidQuery};
use crate::params::{SearchQuery, ServiceQuery};
use crate::state::AppState;
use api_shared::{Claims, DropdownOption, RouteGroup};
use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Router};
use his_core::models::{
    RadiologyReport, RadiologyReportRequest, RadiologyTemplate, RadiologyTemplateRequest,
};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/radiology-templates", get(list_templates).post(create_template))
        .route("/radiology-templates/dropdown-list", get(template_dropdown))
        .route(
            "/radiology-templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/radiology-reports/:id", get(get_report).put(save_report))
        .route("/radiology-reports/:id/pdf", get(radiology_report_pdf));
    guarded(routes, state, RouteGroup::Radiology)
}

// ============================================================================
// TEMPLATES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/radiology-templates",
    tag = "radiology",
    params(PageRequest, SearchQuery),
    responses((status = 200, description = "One page of report templates", body = [RadiologyTemplate]))
)]
#[axum::debug_handler]
pub(crate) async fn list_templates(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> ApiResult<Paginated<RadiologyTemplate>> {
    let templates = state
        .services
        .radiology
        .list_templates(query.search.as_deref(), &page)
        .await?;
    ok("Radiology templates fetched successfully", templates)
}

#[utoipa::path(
    post,
    path = "/api/radiology-templates",
    tag = "radiology",
    request_body = RadiologyTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = RadiologyTemplate),
        (status = 400, description = "Invalid request or template name in use"),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_template(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RadiologyTemplateRequest>,
) -> Created<RadiologyTemplate> {
    let template = state.services.radiology.create_template(req).await?;
    created("Radiology template created successfully", template)
}

#[utoipa::path(
    get,
    path = "/api/radiology-templates/{id}",
    tag = "radiology",
    params(("id" = Uuid, Path, description = "Template id")),
    responses(
        (status = 200, description = "Template", body = RadiologyTemplate),
        (status = 404, description = "Radiology template not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_template(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<RadiologyTemplate> {
    let template = state.services.radiology.get_template(id).await?;
    ok("Radiology template fetched successfully", template)
}

#[utoipa::path(
    put,
    path = "/api/radiology-templates/{id}",
    tag = "radiology",
    params(("id" = Uuid, Path, description = "Template id")),
    request_body = RadiologyTemplateRequest,
    responses(
        (status = 200, description = "Updated template", body = RadiologyTemplate),
        (status = 404, description = "Radiology template not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_template(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<RadiologyTemplateRequest>,
) -> ApiResult<RadiologyTemplate> {
    let template = state.services.radiology.update_template(id, req).await?;
    ok("Radiology template updated successfully", template)
}

#[utoipa::path(
    delete,
    path = "/api/radiology-templates/{id}",
    tag = "radiology",
    params(("id" = Uuid, Path, description = "Template id")),
    responses(
        (status = 200, description = "Template deleted"),
        (status = 404, description = "Radiology template not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_template(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.radiology.delete_template(id).await?;
    done("Radiology template deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/radiology-templates/dropdown-list",
    tag = "radiology",
    params(ServiceQuery),
    responses((status = 200, description = "Templates for the service plus general templates", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn template_dropdown(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ServiceQuery>,
) -> ApiResult<Vec<DropdownOption>> {
    let options = state
        .services
        .radiology
        .template_dropdown(query.service_id)
        .await?;
    ok("Radiology templates fetched successfully", options)
}

// ============================================================================
// REPORTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/radiology-reports/{id}",
    tag = "radiology",
    params(("id" = Uuid, Path, description = "Lab order test id of the radiology test")),
    responses(
        (status = 200, description = "Report", body = RadiologyReport),
        (status = 404, description = "Radiology report not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_report(
    State(state): State<AppState>,
    ResourceId(test_id): ResourceId,
) -> ApiResult<RadiologyReport> {
    let report = state.services.radiology.get_report(test_id).await?;
    ok("Radiology report fetched successfully", report)
}

#[utoipa::path(
    put,
    path = "/api/radiology-reports/{id}",
    tag = "radiology",
    params(("id" = Uuid, Path, description = "Lab order test id of the radiology test")),
    request_body = RadiologyReportRequest,
    responses(
        (status = 200, description = "Report saved and test marked saved", body = RadiologyReport),
        (status = 400, description = "Not a radiology test, or already authorised"),
        (status = 404, description = "Lab test or template not found")
    )
)]
/// Create or replace the report for a radiology test. The caller is recorded as the reporter.
#[axum::debug_handler]
pub(crate) async fn save_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ResourceId(test_id): ResourceId,
    ValidJson(req): ValidJson<RadiologyReportRequest>,
) -> ApiResult<RadiologyReport> {
    let report = state
        .services
        .radiology
        .save_report(test_id, req, claims.id)
        .await?;
    ok("Radiology report saved successfully", report)
}

#[utoipa::path(
    get,
    path = "/api/radiology-reports/{id}/pdf",
    tag = "radiology",
    params(("id" = Uuid, Path, description = "Lab order test id of the radiology test")),
    responses(
        (status = 200, description = "Printable report", content_type = "application/pdf"),
        (status = 404, description = "Radiology report not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn radiology_report_pdf(
    State(state): State<AppState>,
    ResourceId(test_id): ResourceId,
) -> Result<Pdf, ApiError> {
    Ok(Pdf::inline(state.services.radiology.report_pdf(test_id).await?))
}
