//! Planning poker API server entry point.

use std::sync::{Arc, Mutex};

use planpoker_api::broadcast::ChannelBroadcaster;
use planpoker_api::config::AppConfig;
use planpoker_api::error::AppError;
use planpoker_api::routes;
use planpoker_api::state::AppState;
use planpoker_api::telemetry;
use planpoker_core::clock::{Clock, SystemClock};
use planpoker_core::rng::{DeterministicRng, SystemRng};
use planpoker_store::PgStore;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(&config)?;

    tracing::info!(
        otlp_export = telemetry.is_exporting(),
        "Starting planning poker API server"
    );

    let result = run(&config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "server stopped with an error");
    }

    telemetry.shutdown();
    result
}

async fn run(config: &AppConfig) -> Result<(), AppError> {
    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    // Build application state.
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SystemRng::new()));
    let broadcaster = Arc::new(ChannelBroadcaster::default());
    let app_state = AppState::new(Arc::new(PgStore::new(pool)), clock, rng, broadcaster);

    let app = routes::app(app_state);

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
