//! Advault Core Library
//!
//! This crate provides the domain models, pipeline stages, error types and
//! configuration shared by every Advault component.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline_error;
pub mod stage;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AppConfig, BaseConfig, Config, IngestConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use pipeline_error::{IngestError, PipelineError};
pub use stage::{IngestStage, PipelineState};
pub use storage_types::StorageBackend;
