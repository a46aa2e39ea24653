//! `/api/services`, `/api/lab-tests`, `/api/lab-parameters` and `/api/bio-references`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::extract::{ResourceId, ValidJson, ValidQuery};
use crate::params::{ApplicableReferenceQuery, SearchQuery, ServiceDropdownQuery};
use crate::state::AppState;
use api_shared::{DropdownOption, RouteGroup};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use his_core::models::{
    BioReference, BioReferenceRequest, LabParameter, LabParameterRequest, LabTestRequest,
    LabTestView, ReferenceFilter, Service, ServiceFilter, ServiceRequest,
};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/services", get(list_services).post(create_service))
        .route("/services/dropdown-list", get(service_dropdown))
        .route(
            "/services/:id",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/lab-tests", get(list_lab_tests).post(create_lab_test))
        .route(
            "/lab-tests/:id",
            get(get_lab_test).put(update_lab_test).delete(delete_lab_test),
        )
        .route("/lab-parameters", get(list_parameters).post(create_parameter))
        .route("/lab-parameters/dropdown-list", get(parameter_dropdown))
        .route(
            "/lab-parameters/:id",
            get(get_parameter)
                .put(update_parameter)
                .delete(delete_parameter),
        )
        .route("/bio-references", get(list_references).post(create_reference))
        .route("/bio-references/applicable", get(applicable_references))
        .route(
            "/bio-references/:id",
            get(get_reference)
                .put(update_reference)
                .delete(delete_reference),
        );
    guarded(routes, state, RouteGroup::Catalog)
}

// ============================================================================
// SERVICES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "catalog",
    params(PageRequest, ServiceFilter),
    responses((status = 200, description = "One page of billable services", body = [Service]))
)]
#[axum::debug_handler]
pub(crate) async fn list_services(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<ServiceFilter>,
) -> ApiResult<Paginated<Service>> {
    let services = state.services.catalog.list_services(&filter, &page).await?;
    ok("Services fetched successfully", services)
}

#[utoipa::path(
    post,
    path = "/api/services",
    tag = "catalog",
    request_body = ServiceRequest,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Invalid request or service code in use")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_service(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ServiceRequest>,
) -> Created<Service> {
    let service = state.services.catalog.create_service(req).await?;
    created("Service created successfully", service)
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service", body = Service),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_service(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<Service> {
    let service = state.services.catalog.get_service(id).await?;
    ok("Service fetched successfully", service)
}

#[utoipa::path(
    put,
    path = "/api/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = ServiceRequest,
    responses(
        (status = 200, description = "Updated service", body = Service),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_service(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<ServiceRequest>,
) -> ApiResult<Service> {
    let service = state.services.catalog.update_service(id, req).await?;
    ok("Service updated successfully", service)
}

#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service deleted"),
        (status = 400, description = "Service still has a lab test definition"),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_service(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.catalog.delete_service(id).await?;
    done("Service deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/services/dropdown-list",
    tag = "catalog",
    params(ServiceDropdownQuery),
    responses((status = 200, description = "Active services as picker options", body = [DropdownOption]))
)]
/// Active services, optionally only those a desk may charge. `applicability=OPD` also returns
/// services marked `Both`.
#[axum::debug_handler]
pub(crate) async fn service_dropdown(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ServiceDropdownQuery>,
) -> ApiResult<Vec<DropdownOption>> {
    let options = state
        .services
        .catalog
        .service_dropdown(query.applicability, query.category)
        .await?;
    ok("Services fetched successfully", options)
}

// ============================================================================
// LAB TESTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/lab-tests",
    tag = "catalog",
    params(PageRequest, SearchQuery),
    responses((status = 200, description = "One page of test definitions", body = [LabTestView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_lab_tests(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> ApiResult<Paginated<LabTestView>> {
    let tests = state
        .services
        .catalog
        .list_lab_tests(query.search.as_deref(), &page)
        .await?;
    ok("Lab tests fetched successfully", tests)
}

#[utoipa::path(
    post,
    path = "/api/lab-tests",
    tag = "catalog",
    request_body = LabTestRequest,
    responses(
        (status = 201, description = "Test definition created", body = LabTestView),
        (status = 400, description = "Service is not a lab or radiology service, or already has a test"),
        (status = 404, description = "Service or parameter not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_lab_test(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LabTestRequest>,
) -> Created<LabTestView> {
    let test = state.services.catalog.create_lab_test(req).await?;
    created("Lab test created successfully", test)
}

#[utoipa::path(
    get,
    path = "/api/lab-tests/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Lab test id")),
    responses(
        (status = 200, description = "Test definition with parameters", body = LabTestView),
        (status = 404, description = "Lab test not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_lab_test(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<LabTestView> {
    let test = state.services.catalog.get_lab_test(id).await?;
    ok("Lab test fetched successfully", test)
}

#[utoipa::path(
    put,
    path = "/api/lab-tests/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Lab test id")),
    request_body = LabTestRequest,
    responses(
        (status = 200, description = "Updated test definition", body = LabTestView),
        (status = 404, description = "Lab test not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_lab_test(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<LabTestRequest>,
) -> ApiResult<LabTestView> {
    let test = state.services.catalog.update_lab_test(id, req).await?;
    ok("Lab test updated successfully", test)
}

#[utoipa::path(
    delete,
    path = "/api/lab-tests/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Lab test id")),
    responses(
        (status = 200, description = "Test definition deleted"),
        (status = 404, description = "Lab test not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_lab_test(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.catalog.delete_lab_test(id).await?;
    done("Lab test deleted successfully")
}

// ============================================================================
// LAB PARAMETERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/lab-parameters",
    tag = "catalog",
    params(PageRequest, SearchQuery),
    responses((status = 200, description = "One page of parameters", body = [LabParameter]))
)]
#[axum::debug_handler]
pub(crate) async fn list_parameters(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> ApiResult<Paginated<LabParameter>> {
    let parameters = state
        .services
        .catalog
        .list_parameters(query.search.as_deref(), &page)
        .await?;
    ok("Lab parameters fetched successfully", parameters)
}

#[utoipa::path(
    post,
    path = "/api/lab-parameters",
    tag = "catalog",
    request_body = LabParameterRequest,
    responses(
        (status = 201, description = "Parameter created", body = LabParameter),
        (status = 400, description = "Invalid request")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_parameter(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LabParameterRequest>,
) -> Created<LabParameter> {
    let parameter = state.services.catalog.create_parameter(req).await?;
    created("Lab parameter created successfully", parameter)
}

#[utoipa::path(
    get,
    path = "/api/lab-parameters/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Parameter id")),
    responses(
        (status = 200, description = "Parameter", body = LabParameter),
        (status = 404, description = "Lab parameter not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_parameter(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<LabParameter> {
    let parameter = state.services.catalog.get_parameter(id).await?;
    ok("Lab parameter fetched successfully", parameter)
}

#[utoipa::path(
    put,
    path = "/api/lab-parameters/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Parameter id")),
    request_body = LabParameterRequest,
    responses(
        (status = 200, description = "Updated parameter", body = LabParameter),
        (status = 404, description = "Lab parameter not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_parameter(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<LabParameterRequest>,
) -> ApiResult<LabParameter> {
    let parameter = state.services.catalog.update_parameter(id, req).await?;
    ok("Lab parameter updated successfully", parameter)
}

#[utoipa::path(
    delete,
    path = "/api/lab-parameters/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Parameter id")),
    responses(
        (status = 200, description = "Parameter and its references deleted"),
        (status = 400, description = "Parameter is used by a lab test"),
        (status = 404, description = "Lab parameter not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_parameter(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.catalog.delete_parameter(id).await?;
    done("Lab parameter deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/lab-parameters/dropdown-list",
    tag = "catalog",
    responses((status = 200, description = "Picker options", body = [DropdownOption]))
)]
#[axum::debug_handler]
pub(crate) async fn parameter_dropdown(
    State(state): State<AppState>,
) -> ApiResult<Vec<DropdownOption>> {
    let options = state.services.catalog.parameter_dropdown().await?;
    ok("Lab parameters fetched successfully", options)
}

// ============================================================================
// BIO REFERENCES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/bio-references",
    tag = "catalog",
    params(PageRequest, ReferenceFilter),
    responses((status = 200, description = "One page of reference ranges", body = [BioReference]))
)]
#[axum::debug_handler]
pub(crate) async fn list_references(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<ReferenceFilter>,
) -> ApiResult<Paginated<BioReference>> {
    let references = state.services.catalog.list_references(&filter, &page).await?;
    ok("Bio references fetched successfully", references)
}

#[utoipa::path(
    post,
    path = "/api/bio-references",
    tag = "catalog",
    request_body = BioReferenceRequest,
    responses(
        (status = 201, description = "Reference range created", body = BioReference),
        (status = 400, description = "Invalid range"),
        (status = 404, description = "Lab parameter not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_reference(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<BioReferenceRequest>,
) -> Created<BioReference> {
    let reference = state.services.catalog.create_reference(req).await?;
    created("Bio reference created successfully", reference)
}

#[utoipa::path(
    get,
    path = "/api/bio-references/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Reference id")),
    responses(
        (status = 200, description = "Reference range", body = BioReference),
        (status = 404, description = "Bio reference not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_reference(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<BioReference> {
    let reference = state.services.catalog.get_reference(id).await?;
    ok("Bio reference fetched successfully", reference)
}

#[utoipa::path(
    put,
    path = "/api/bio-references/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Reference id")),
    request_body = BioReferenceRequest,
    responses(
        (status = 200, description = "Updated reference range", body = BioReference),
        (status = 404, description = "Bio reference not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_reference(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<BioReferenceRequest>,
) -> ApiResult<BioReference> {
    let reference = state.services.catalog.update_reference(id, req).await?;
    ok("Bio reference updated successfully", reference)
}

#[utoipa::path(
    delete,
    path = "/api/bio-references/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Reference id")),
    responses(
        (status = 200, description = "Reference range deleted"),
        (status = 404, description = "Bio reference not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_reference(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.catalog.delete_reference(id).await?;
    done("Bio reference deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/bio-references/applicable",
    tag = "catalog",
    params(ApplicableReferenceQuery),
    responses(
        (status = 200, description = "Ranges matching the patient's gender and age", body = [BioReference]),
        (status = 404, description = "Parameter or patient not found")
    )
)]
/// Reference ranges of a parameter that apply to a given patient.
#[axum::debug_handler]
pub(crate) async fn applicable_references(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ApplicableReferenceQuery>,
) -> ApiResult<Vec<BioReference>> {
    let references = state
        .services
        .catalog
        .applicable_references(query.parameter_id, query.patient_id)
        .await?;
    ok("Bio references fetched successfully", references)
}
