//! `/api/appointments`.

use super::{created, done, ok, ApiResult, Created};
use crate::auth::guarded;
use crate::extract::{parse_json, ResourceId, ValidJson, ValidQuery};
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use his_core::models::{
    Appointment, AppointmentFilter, AppointmentRequest, AppointmentStatusRequest,
    AppointmentView, ConvertAppointmentRequest, Visit,
};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route(
            "/appointments/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/:id/status", put(set_appointment_status))
        .route("/appointments/:id/convert", post(convert_appointment));
    guarded(routes, state, RouteGroup::Appointments)
}

#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "appointments",
    params(PageRequest, AppointmentFilter),
    responses((status = 200, description = "One page of appointments, earliest first", body = [AppointmentView]))
)]
#[axum::debug_handler]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(filter): ValidQuery<AppointmentFilter>,
) -> ApiResult<Paginated<AppointmentView>> {
    let appointments = state.services.appointments.list(&filter, &page).await?;
    ok("Appointments fetched successfully", appointments)
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "appointments",
    request_body = AppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 404, description = "Doctor not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_appointment(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<AppointmentRequest>,
) -> Created<Appointment> {
    let appointment = state.services.appointments.create(req).await?;
    created("Appointment created successfully", appointment)
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment with doctor", body = AppointmentView),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_appointment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<AppointmentView> {
    let appointment = state.services.appointments.get(id).await?;
    ok("Appointment fetched successfully", appointment)
}

#[utoipa::path(
    put,
    path = "/api/appointments/{id}",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = AppointmentRequest,
    responses(
        (status = 200, description = "Updated appointment", body = Appointment),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_appointment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<AppointmentRequest>,
) -> ApiResult<Appointment> {
    let appointment = state.services.appointments.update(id, req).await?;
    ok("Appointment updated successfully", appointment)
}

#[utoipa::path(
    put,
    path = "/api/appointments/{id}/status",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = AppointmentStatusRequest,
    responses(
        (status = 200, description = "Appointment with its new status", body = Appointment),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn set_appointment_status(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<AppointmentStatusRequest>,
) -> ApiResult<Appointment> {
    let appointment = state.services.appointments.set_status(id, req).await?;
    ok("Appointment status updated successfully", appointment)
}

#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment deleted"),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_appointment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<()> {
    state.services.appointments.delete(id).await?;
    done("Appointment deleted successfully")
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/convert",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = ConvertAppointmentRequest,
    responses(
        (status = 201, description = "Visit opened for the appointment", body = Visit),
        (status = 400, description = "Appointment cannot be converted"),
        (status = 404, description = "Appointment or patient not found")
    )
)]
/// Open a visit from an appointment and mark the appointment completed.
///
/// The body is optional; it is only needed to name the patient when the appointment was booked
/// for an unregistered caller.
#[axum::debug_handler]
pub(crate) async fn convert_appointment(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    body: Bytes,
) -> Created<Visit> {
    let req = if body.is_empty() {
        ConvertAppointmentRequest::default()
    } else {
        parse_json(&body)?
    };
    let visit = state.services.appointments.convert_to_visit(id, req).await?;
    created("Appointment converted to visit successfully", visit)
}
