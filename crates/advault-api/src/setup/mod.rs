//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use crate::telemetry::{init_telemetry, LogFormat};
use advault_core::Config;
use advault_db::AdRepository;
use advault_ingest::IngestPipeline;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    init_telemetry(LogFormat::from_env())?;
    crate::error::set_production_mode(config.is_production());

    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        analysis_enabled = config.ingest().gemini_api_key.is_some(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let store = Arc::new(AdRepository::new(pool));

    let pipeline = IngestPipeline::from_config(config.ingest(), storage.clone(), store.clone())
        .context("Failed to build ingestion pipeline")?;

    let state = Arc::new(AppState::new(Arc::new(pipeline), store, storage));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
