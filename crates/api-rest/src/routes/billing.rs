//! `/api/opd-billing`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::error::ApiError;
use crate::extract::{Pdf, ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::extract::State;
use axum::routing::{get, put};
use axum::Router;
use his_core::models::{BillingFilter, OpdBillingRequest, OpdBillingView, OpdPaymentRequest};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/opd-billing", get(list_opd_bills).post(create_opd_bill))
        .route("/opd-billing/:id", get(get_opd_bill).delete(delete_opd_bill))
        .route("/opd-billing/:id/payment", put(update_opd_payment))
        .route("/opd-billing/:id/pdf", get(opd_bill_pdf));
    guarded(routes, state, RouteGroup::OpdBilling)
}

#[utoipa::path(
    get,
    path = "/api/opd-billing",
    tag = "billing",
    params(PageRequest, BillingFilter),
    responses((status = 200, description = "One page of OPD bills, newest first", body = [OpdBillingView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_opd_bills(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<BillingFilter>,
) -> ApiResult<Paginated<OpdBillingView>> {
    let bills = state.services.opd.list(&filter, &page).await?;
    ok("OPD bills fetched successfully", bills)
}

#[utoipa::path(
    post,
    path = "/api/opd-billing",
    tag = "billing",
    request_body = OpdBillingRequest,
    responses(
        (status = 201, description = "Bill created; lab and radiology lines were sent to the lab", body = OpdBillingView),
        (status = 400, description = "Invalid request, or a service is inactive or not billable in OPD"),
        (status = 404, description = "Patient, visit, doctor or service not found")
    )
)]
/// Create an OPD bill.
///
/// The bill, its lab order and one lab test per laboratory or radiology line are written
/// together. If any line is rejected nothing is stored.
#[axum::debug_handler]
pub(crate) async fn create_opd_bill(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<OpdBillingRequest>,
) -> Created<OpdBillingView> {
    let bill = state.services.opd.create(req).await?;
    created("OPD bill created successfully", bill)
}

#[utoipa::path(
    get,
    path = "/api/opd-billing/{id}",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill with patient and doctor", body = OpdBillingView),
        (status = 404, description = "OPD bill not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_opd_bill(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<OpdBillingView> {
    let bill = state.services.opd.get(id).await?;
    ok("OPD bill fetched successfully", bill)
}

#[utoipa::path(
    put,
    path = "/api/opd-billing/{id}/payment",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Bill id")),
    request_body = OpdPaymentRequest,
    responses(
        (status = 200, description = "Bill with recomputed totals", body = OpdBillingView),
        (status = 404, description = "OPD bill not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_opd_payment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<OpdPaymentRequest>,
) -> ApiResult<OpdBillingView> {
    let bill = state.services.opd.update_payment(id, req).await?;
    ok("Payment updated successfully", bill)
}

#[utoipa::path(
    delete,
    path = "/api/opd-billing/{id}",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill and its pending lab order deleted"),
        (status = 400, description = "Lab work has already started on this bill"),
        (status = 404, description = "OPD bill not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_opd_bill(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.opd.delete(id).await?;
    done("OPD bill deleted successfully")
}

#[utoipa::path(
    get,
    path = "/api/opd-billing/{id}/pdf",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Printable bill", content_type = "application/pdf"),
        (status = 404, description = "OPD bill not found")
    )
)]
/// Download the bill as a PDF attachment named after the bill number.
#[axum::debug_handler]
pub(crate) async fn opd_bill_pdf(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Pdf, ApiError> {
    Ok(Pdf::attachment(state.services.opd.bill_pdf(id).await?))
}
