use advault_core::Config;
use advault_storage::{create_storage, Storage};
use anyhow::Result;
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;

    tracing::info!(backend = %storage.backend_type(), "Storage initialized");
    Ok(storage)
}
