//! # API REST
//!
//! REST API implementation for the HIS.
//!
//! Handles:
//! - HTTP endpoints with axum, one module per resource
//! - Bearer-token authentication and the role policy per route group
//! - Mapping `HisError` onto status codes and the response envelope
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON extraction, PDF downloads, CORS, request tracing)
//!
//! Uses `api-shared` for auth primitives and envelopes, and `his-core` for everything else.

#![warn(rust_2018_idioms)]

mod auth;
mod docs;
pub mod error;
pub mod extract;
mod params;
mod routes;
mod state;

pub use docs::ApiDoc;
pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// The complete HTTP application: `/health`, `/api/*` and Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api(&state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
