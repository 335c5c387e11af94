use advault_core::AppError;

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Primary-key uniqueness violation: an ad with this id already exists
    #[error("Ad {0} already exists")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt ad record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(id) => AppError::Conflict(format!("Ad {} already exists", id)),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Corrupt { id, reason } => {
                AppError::Internal(format!("Corrupt ad record {}: {}", id, reason))
            }
            StoreError::Unavailable(msg) => AppError::Internal(msg),
        }
    }
}
