//! `/api/auth/*`. These answer in the `{success, message, data}` envelope.

use crate::auth::{guarded, logged_in};
use crate::error::{ApiError, LegacyError};
use crate::extract::ValidJson;
use crate::state::AppState;
use api_shared::{Claims, LegacyResponse, RouteGroup};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use his_core::models::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};

type LegacyResult<T> = Result<Json<LegacyResponse<T>>, LegacyError>;

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new().route("/auth/login", post(login));
    let register = guarded(
        Router::new().route("/auth/register", post(register)),
        state,
        RouteGroup::Users,
    );
    let me = logged_in(Router::new().route("/auth/me", get(me)), state);
    public.merge(register).merge(me)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed token and profile", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account is deactivated")
    ),
    security(())
)]
/// Exchange email and password for a bearer token.
#[axum::debug_handler]
pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<ValidJson<LoginRequest>, ApiError>,
) -> LegacyResult<LoginResponse> {
    let ValidJson(req) = body?;
    let res = state.services.users.login(req).await?;
    Ok(Json(LegacyResponse::ok("Login successful", res)))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserProfile),
        (status = 400, description = "Invalid request or email already registered"),
        (status = 403, description = "Caller is not an admin")
    )
)]
/// Register a staff login. Admin only.
#[axum::debug_handler]
pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<ValidJson<RegisterRequest>, ApiError>,
) -> Result<(StatusCode, Json<LegacyResponse<UserProfile>>), LegacyError> {
    let ValidJson(req) = body?;
    let user = state.services.users.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(LegacyResponse::ok("User registered successfully", user)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Profile of the caller", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub(crate) async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> LegacyResult<UserProfile> {
    let user = state.services.users.me(claims.id).await?;
    Ok(Json(LegacyResponse::ok("User fetched successfully", user)))
}
