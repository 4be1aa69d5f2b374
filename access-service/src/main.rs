use access_service::{
    build_router,
    config::AccessConfig,
    services::{metrics::init_metrics, MongoDb, SystemClock},
    utils::shutdown::{serve_with_drain_deadline, shutdown_signal, DrainOutcome},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AccessConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    init_metrics().map_err(AppError::ConfigError)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment.as_str(),
        "Starting access service"
    );

    tracing::info!("Initializing database connection");
    let db = MongoDb::connect(&config.mongodb).await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    let grace = Duration::from_secs(config.common.shutdown_grace_seconds);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let state = AppState::new(config.clone(), Arc::new(db.clone()), Arc::new(SystemClock))?;
    let app = build_router(state).await?;

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment.as_str(),
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let outcome = serve_with_drain_deadline(listener, app, shutdown_signal(), grace).await?;
    tracing::info!(drained = outcome == DrainOutcome::Completed, "Server stopped");

    db.shutdown().await;
    tracing::info!("Service shutdown complete");
    Ok(())
}
