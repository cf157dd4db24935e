//! services/api/src/bin/api.rs

use std::sync::Arc;

use api_lib::{
    adapters::{DbAdapter, MemoryStore},
    config::{Config, StoreBackend},
    error::ApiError,
    web::{app_router, state::AppState},
};
use sqlx::postgres::PgPoolOptions;
use task_tracker_core::ports::{IdentityStore, TaskStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select and Initialize the Store Backend ---
    let (identity, tasks): (Arc<dyn IdentityStore>, Arc<dyn TaskStore>) =
        match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config.database_url.clone().ok_or_else(|| {
                    ApiError::Internal(
                        "DATABASE_URL is required for the postgres backend".to_string(),
                    )
                })?;
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                (db_adapter.clone(), db_adapter)
            }
            StoreBackend::Memory => {
                info!("Using the in-memory store; data will not survive a restart.");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    // --- 3. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(identity, tasks, config.clone()));
    let app = app_router(app_state.clone())?;

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = TcpListener::bind(&config.bind_address).await?;
    let shutdown = app_state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            // Ends every page drive loop before the process exits.
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
