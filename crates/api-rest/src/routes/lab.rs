//! `/api/lab-orders` and `/api/lab-order-tests`: the lab worklist.

use super::{ok, ApiResult};
use crate::auth::guarded;
use crate::error::ApiError;
use crate::extract::{Pdf, ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::{Claims, RouteGroup};
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use his_core::models::{
    LabOrderFilter, LabOrderTest, LabOrderView, LabRemarksRequest, LabStatusRequest,
    LabTestDetail, SaveResultsRequest,
};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/lab-orders", get(list_lab_orders))
        .route("/lab-orders/:id", get(get_lab_order))
        .route("/lab-orders/:id/report", get(lab_report_pdf))
        .route("/lab-order-tests/:id", get(get_order_test))
        .route("/lab-order-tests/:id/collect", post(collect_sample))
        .route("/lab-order-tests/:id/results", put(save_results))
        .route("/lab-order-tests/:id/authorize", post(authorize_test))
        .route("/lab-order-tests/:id/status", put(set_test_status));
    guarded(routes, state, RouteGroup::Lab)
}

#[utoipa::path(
    get,
    path = "/api/lab-orders",
    tag = "lab",
    params(PageRequest, LabOrderFilter),
    responses((status = 200, description = "One page of lab orders with their tests", body = [LabOrderView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_lab_orders(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<LabOrderFilter>,
) -> ApiResult<Paginated<LabOrderView>> {
    let orders = state.services.lab.list_orders(&filter, &page).await?;
    ok("Lab orders fetched successfully", orders)
}

#[utoipa::path(
    get,
    path = "/api/lab-orders/{id}",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order id")),
    responses(
        (status = 200, description = "Order with tests and patient", body = LabOrderView),
        (status = 404, description = "Lab order not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_lab_order(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<LabOrderView> {
    let order = state.services.lab.get_order(id).await?;
    ok("Lab order fetched successfully", order)
}

#[utoipa::path(
    get,
    path = "/api/lab-orders/{id}/report",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order id")),
    responses(
        (status = 200, description = "Lab report", content_type = "application/pdf"),
        (status = 400, description = "No results are ready to report"),
        (status = 404, description = "Lab order not found")
    )
)]
/// Lab report for every test on the order that has saved or authorised results.
#[axum::debug_handler]
pub(crate) async fn lab_report_pdf(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Pdf, ApiError> {
    Ok(Pdf::inline(state.services.lab.report_pdf(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/lab-order-tests/{id}",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order test id")),
    responses(
        (status = 200, description = "Test with parameters, applicable references and results", body = LabTestDetail),
        (status = 404, description = "Lab test not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_order_test(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<LabTestDetail> {
    let detail = state.services.lab.get_test(id).await?;
    ok("Lab test fetched successfully", detail)
}

#[utoipa::path(
    post,
    path = "/api/lab-order-tests/{id}/collect",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order test id")),
    responses(
        (status = 200, description = "Sample marked collected", body = LabOrderTest),
        (status = 400, description = "Test is not pending"),
        (status = 404, description = "Lab test not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn collect_sample(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<LabOrderTest> {
    let test = state.services.lab.collect(id).await?;
    ok("Sample collected successfully", test)
}

#[utoipa::path(
    put,
    path = "/api/lab-order-tests/{id}/results",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order test id")),
    request_body = SaveResultsRequest,
    responses(
        (status = 200, description = "Results saved", body = LabTestDetail),
        (status = 400, description = "Sample not collected, or a parameter is not part of the test"),
        (status = 404, description = "Lab test not found")
    )
)]
/// Save or overwrite result values. Saving twice replaces the earlier value per parameter.
#[axum::debug_handler]
pub(crate) async fn save_results(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<SaveResultsRequest>,
) -> ApiResult<LabTestDetail> {
    let detail = state.services.lab.save_results(id, req).await?;
    ok("Results saved successfully", detail)
}

#[utoipa::path(
    post,
    path = "/api/lab-order-tests/{id}/authorize",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order test id")),
    request_body = LabRemarksRequest,
    responses(
        (status = 200, description = "Results authorised", body = LabOrderTest),
        (status = 400, description = "Results have not been saved"),
        (status = 404, description = "Lab test not found")
    )
)]
/// Sign off saved results. The caller is recorded as the authoriser.
#[axum::debug_handler]
pub(crate) async fn authorize_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<LabRemarksRequest>,
) -> ApiResult<LabOrderTest> {
    let test = state.services.lab.authorize(id, req, claims.id).await?;
    ok("Results authorized successfully", test)
}

#[utoipa::path(
    put,
    path = "/api/lab-order-tests/{id}/status",
    tag = "lab",
    params(("id" = Uuid, Path, description = "Lab order test id")),
    request_body = LabStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = LabOrderTest),
        (status = 404, description = "Lab test not found")
    )
)]
/// Set a test's status directly, bypassing the workflow checks. The parent order's status is
/// recomputed.
#[axum::debug_handler]
pub(crate) async fn set_test_status(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<LabStatusRequest>,
) -> ApiResult<LabOrderTest> {
    let test = state.services.lab.set_status(id, req).await?;
    ok("Lab test status updated successfully", test)
}
