//! Error kinds produced by the ingestion pipeline.
//!
//! Collaborators return a bare [`PipelineError`]; the orchestrator attaches
//! the stage it was in and surfaces an [`IngestError`].

use crate::error::{ErrorMetadata, LogLevel};
use crate::stage::IngestStage;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid post URL: {0}")]
    InvalidUrl(String),

    #[error("Ad already exists: {0}")]
    AlreadyExists(String),

    #[error("Failed to fetch post metadata: {0}")]
    FetchFailed(String),

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("No video found in post")]
    NoVideoInPost,

    #[error("Failed to download video: {message}")]
    DownloadFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Video exceeds the {limit_bytes} byte download limit")]
    MediaTooLarge { limit_bytes: u64 },

    #[error("Failed to store video: {0}")]
    StorageFailed(String),

    #[error("Transcription failed: {status} - {body}")]
    TranscriptionFailed { status: u16, body: String },

    #[error("Failed to save ad: {0}")]
    PersistFailed(String),

    #[error("Timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("Ingestion cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn download_status(status: u16) -> Self {
        PipelineError::DownloadFailed {
            status: Some(status),
            message: format!("HTTP {}", status),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::InvalidUrl(_) => "InvalidUrl",
            PipelineError::AlreadyExists(_) => "AlreadyExists",
            PipelineError::FetchFailed(_) => "FetchFailed",
            PipelineError::PostNotFound(_) => "PostNotFound",
            PipelineError::NoVideoInPost => "NoVideoInPost",
            PipelineError::DownloadFailed { .. } => "DownloadFailed",
            PipelineError::MediaTooLarge { .. } => "MediaTooLarge",
            PipelineError::StorageFailed(_) => "StorageFailed",
            PipelineError::TranscriptionFailed { .. } => "TranscriptionFailed",
            PipelineError::PersistFailed(_) => "PersistFailed",
            PipelineError::Timeout { .. } => "Timeout",
            PipelineError::Cancelled => "Cancelled",
        }
    }
}

/// Static metadata for each kind: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn pipeline_error_static_metadata(
    err: &PipelineError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        PipelineError::InvalidUrl(_) => (
            400,
            "INVALID_URL",
            false,
            Some("Use a link of the form https://x.com/<handle>/status/<id>"),
            false,
            LogLevel::Debug,
        ),
        PipelineError::AlreadyExists(_) => (
            409,
            "AD_ALREADY_EXISTS",
            false,
            Some("Open the existing ad instead of ingesting it again"),
            false,
            LogLevel::Debug,
        ),
        PipelineError::FetchFailed(_) => (
            502,
            "FETCH_FAILED",
            true,
            Some("Retry the ingestion later"),
            true,
            LogLevel::Warn,
        ),
        PipelineError::PostNotFound(_) => (
            404,
            "POST_NOT_FOUND",
            false,
            Some("Check that the post exists and is public"),
            false,
            LogLevel::Debug,
        ),
        PipelineError::NoVideoInPost => (
            422,
            "NO_VIDEO_IN_POST",
            false,
            Some("Submit a post that contains a video"),
            false,
            LogLevel::Debug,
        ),
        PipelineError::DownloadFailed { .. } => (
            502,
            "DOWNLOAD_FAILED",
            true,
            Some("Retry the ingestion later"),
            true,
            LogLevel::Warn,
        ),
        PipelineError::MediaTooLarge { .. } => (
            413,
            "MEDIA_TOO_LARGE",
            false,
            Some("Raise MAX_VIDEO_SIZE_MB or skip this post"),
            false,
            LogLevel::Warn,
        ),
        PipelineError::StorageFailed(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        PipelineError::TranscriptionFailed { .. } => (
            502,
            "TRANSCRIPTION_FAILED",
            true,
            Some("Retry the ingestion later"),
            true,
            LogLevel::Warn,
        ),
        PipelineError::PersistFailed(_) => (
            500,
            "PERSIST_FAILED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        PipelineError::Timeout { .. } => (
            504,
            "STAGE_TIMEOUT",
            true,
            Some("Retry the ingestion later"),
            false,
            LogLevel::Warn,
        ),
        PipelineError::Cancelled => (
            503,
            "INGESTION_CANCELLED",
            true,
            Some("Resubmit the URL"),
            false,
            LogLevel::Warn,
        ),
    }
}

impl ErrorMetadata for PipelineError {
    fn http_status_code(&self) -> u16 {
        pipeline_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        pipeline_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        pipeline_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        pipeline_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        pipeline_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        pipeline_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::InvalidUrl(_) => "Invalid post URL".to_string(),
            PipelineError::AlreadyExists(_) => "Ad already exists".to_string(),
            PipelineError::FetchFailed(_) => "Failed to fetch post metadata".to_string(),
            PipelineError::PostNotFound(ref msg) => format!("Post not found: {}", msg),
            PipelineError::NoVideoInPost => "No video found in post".to_string(),
            PipelineError::DownloadFailed { status, .. } => match status {
                Some(code) => format!("Failed to download video (HTTP {})", code),
                None => "Failed to download video".to_string(),
            },
            PipelineError::MediaTooLarge { limit_bytes } => {
                format!("Video exceeds the {} byte download limit", limit_bytes)
            }
            PipelineError::StorageFailed(_) => "Failed to store video".to_string(),
            PipelineError::TranscriptionFailed { status, .. } => {
                format!("Transcription service failed (status {})", status)
            }
            PipelineError::PersistFailed(_) => "Failed to save ad".to_string(),
            PipelineError::Timeout { after_secs } => format!("Timed out after {}s", after_secs),
            PipelineError::Cancelled => "Ingestion cancelled".to_string(),
        }
    }
}

/// Terminal failure of one ingestion: the stage it happened in plus the kind.
#[derive(Debug, thiserror::Error)]
#[error("{kind} (stage: {stage})")]
pub struct IngestError {
    pub stage: IngestStage,
    pub kind: PipelineError,
}

impl IngestError {
    pub fn new(stage: IngestStage, kind: PipelineError) -> Self {
        Self { stage, kind }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self.kind, PipelineError::AlreadyExists(_))
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        self.kind.http_status_code()
    }

    fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.kind.suggested_action()
    }

    fn client_message(&self) -> String {
        format!("{} (stage: {})", self.kind.client_message(), self.stage)
    }

    fn is_sensitive(&self) -> bool {
        self.kind.is_sensitive()
    }

    fn log_level(&self) -> LogLevel {
        self.kind.log_level()
    }
}
