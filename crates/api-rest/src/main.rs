//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `his-run` binary adds graceful shutdown and is what
//! deployments run.

use api_rest::{router, AppState};
use his_core::{bootstrap, AppConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the HIS REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `HIS_REST_ADDR` or `PORT`: listen address
/// - `DATABASE_URL`: Postgres connection string (in-memory store when unset outside production)
/// - `JWT_SECRET`, `JWT_EXPIRY_HOURS`, `APP_ENV`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the store cannot be reached,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("his_api_rest=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("his_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    let addr = config.bind_addr();

    tracing::info!("-- Starting HIS REST API on {}", addr);

    let store = bootstrap::open_store(&config).await?;
    let state = AppState::new(bootstrap::context(store, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
