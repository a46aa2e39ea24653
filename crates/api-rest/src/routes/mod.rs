//! Route handlers, one module per resource.
//!
//! Each module exposes `router(&AppState)` returning its routes already wrapped in the policy
//! guard for its [`RouteGroup`](api_shared::RouteGroup). Paths are relative to `/api`.

pub(crate) mod appointments;
pub(crate) mod auth;
pub(crate) mod billing;
pub(crate) mod catalog;
pub(crate) mod clinical;
pub(crate) mod dashboard;
pub(crate) mod doctors;
pub(crate) mod facilities;
pub(crate) mod health;
pub(crate) mod ipd;
pub(crate) mod lab;
pub(crate) mod patients;
pub(crate) mod radiology;
pub(crate) mod users;
pub(crate) mod visits;
pub(crate) mod vocab;

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::ApiResponse;
use axum::http::StatusCode;
use axum::{Json, Router};

pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub(crate) type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub(crate) fn ok<T>(message: &str, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(message, data)))
}

pub(crate) fn created<T>(message: &str, data: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, data))))
}

pub(crate) fn done(message: &str) -> ApiResult<()> {
    Ok(Json(ApiResponse::done(message)))
}

/// Every `/api` route.
pub(crate) fn api(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router(state))
        .merge(users::router(state))
        .merge(vocab::router(state))
        .merge(patients::router(state))
        .merge(doctors::router(state))
        .merge(visits::router(state))
        .merge(appointments::router(state))
        .merge(facilities::router(state))
        .merge(catalog::router(state))
        .merge(billing::router(state))
        .merge(ipd::router(state))
        .merge(lab::router(state))
        .merge(radiology::router(state))
        .merge(clinical::router(state))
        .merge(dashboard::router(state))
}
