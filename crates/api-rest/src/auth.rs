//! Bearer-token middleware.
//!
//! Every protected route group is wrapped by [`guarded`], which verifies the token, checks the
//! caller's role against the [`Policy`](api_shared::Policy) table and stores the [`Claims`] in
//! the request extensions for handlers that need the caller's id.

use crate::error::ApiError;
use crate::state::AppState;
use api_shared::{extract_bearer_token, Access, Claims, RouteGroup};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;

/// Reads are `GET` and `HEAD`; anything else changes state.
pub(crate) fn access_for(method: &Method) -> Access {
    if method == Method::GET || method == Method::HEAD {
        Access::Read
    } else {
        Access::Write
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    let token = extract_bearer_token(header)?;
    Ok(state.keys.verify(token, state.clock.now())?)
}

/// Any valid token passes.
pub(crate) async fn require_login(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, req.headers())?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

#[derive(Clone)]
pub(crate) struct Guard {
    state: AppState,
    group: RouteGroup,
}

pub(crate) async fn require_role(
    State(guard): State<Guard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&guard.state, req.headers())?;
    let access = access_for(req.method());
    if let Err(err) = guard.state.policy.authorize(guard.group, access, claims.role) {
        tracing::warn!(
            user = %claims.id,
            role = claims.role.as_str(),
            group = ?guard.group,
            path = %req.uri().path(),
            "access denied"
        );
        return Err(err.into());
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Put every route of `router` behind the policy rule for `group`.
pub(crate) fn guarded(
    router: Router<AppState>,
    state: &AppState,
    group: RouteGroup,
) -> Router<AppState> {
    let guard = Guard {
        state: state.clone(),
        group,
    };
    router.route_layer(middleware::from_fn_with_state(guard, require_role))
}

/// Put every route of `router` behind a login check only.
pub(crate) fn logged_in(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state.clone(), require_login))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_for_method() {
        assert_eq!(access_for(&Method::GET), Access::Read);
        assert_eq!(access_for(&Method::HEAD), Access::Read);
        assert_eq!(access_for(&Method::POST), Access::Write);
        assert_eq!(access_for(&Method::PUT), Access::Write);
        assert_eq!(access_for(&Method::DELETE), Access::Write);
    }
}
