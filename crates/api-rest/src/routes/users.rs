//! `/api/users`: staff logins, admin only.

use super::{ok, ApiResult};
use crate::auth::guarded;
use crate::extract::{ResourceId, ValidJson, ValidQuery};
use crate::params::RoleQuery;
use crate::state::AppState;
use api_shared::RouteGroup;
use axum::extract::State;
use axum::routing::{get, put};
use axum::Router;
use his_core::models::{UserProfile, UserStatusRequest};
use his_core::{PageRequest, Paginated};

pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/status", put(set_user_status));
    guarded(routes, state, RouteGroup::Users)
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageRequest, RoleQuery),
    responses((status = 200, description = "One page of users", body = [UserProfile]))
)]
#[axum::debug_handler]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    ValidQuery(page): ValidQuery<PageRequest>,
    ValidQuery(query): ValidQuery<RoleQuery>,
) -> ApiResult<Paginated<UserProfile>> {
    let users = state.services.users.list(query.role, &page).await?;
    ok("Users fetched successfully", users)
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> ApiResult<UserProfile> {
    let user = state.services.users.me(id).await?;
    ok("User fetched successfully", user)
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/status",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserStatusRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
/// Activate or deactivate a login. Deactivated users cannot log in.
#[axum::debug_handler]
pub(crate) async fn set_user_status(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
    ValidJson(req): ValidJson<UserStatusRequest>,
) -> ApiResult<UserProfile> {
    let user = state.services.users.set_active(id, req).await?;
    ok("User status updated successfully", user)
}
