//! Application state shared by every handler.

use std::sync::Arc;

use advault_db::AdStore;
use advault_ingest::IngestPipeline;
use advault_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub store: Arc<dyn AdStore>,
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<IngestPipeline>,
        store: Arc<dyn AdStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            pipeline,
            store,
            storage,
        }
    }
}
