use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use his_core::{bootstrap, AppConfig};

/// Main entry point for the HIS application
///
/// Resolves configuration, connects and migrates the store, then serves the REST API until
/// Ctrl-C. In-flight requests are allowed to finish before the process exits.
///
/// # Environment Variables
/// - `HIS_REST_ADDR`: REST server address (default: "0.0.0.0:$PORT", `PORT` defaulting to 3000)
/// - `APP_ENV`: `production` requires `DATABASE_URL` and `JWT_SECRET`
/// - `DATABASE_URL`: Postgres connection string; without it a memory store is used
/// - `JWT_SECRET`, `JWT_EXPIRY_HOURS`: token signing
/// - `HIS_UTC_OFFSET`: offset used for day boundaries in codes and reports (default "+05:30")
/// - `HIS_HOSPITAL_NAME`: letterhead on printed documents
///
/// # Returns
/// * `Ok(())` - If the server shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, the store or the listener fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("his_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("his_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    let rest_addr = config.bind_addr();

    let store = match bootstrap::open_store(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("store unavailable: {}", err);
            std::process::exit(1);
        }
    };

    tracing::info!("++ Starting HIS REST on {}", rest_addr);

    let state = AppState::new(bootstrap::context(store, config));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- HIS stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
