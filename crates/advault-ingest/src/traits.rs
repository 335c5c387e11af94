//! Collaborator interfaces injected into the ingestion pipeline

use advault_core::models::{AdAnalysis, PostMetadata, Shot, Transcript};
use advault_core::PipelineError;
use async_trait::async_trait;

/// Reads post text and the best video link from the platform's metadata API.
#[async_trait]
pub trait PostMetadataFetcher: Send + Sync {
    async fn fetch_metadata(
        &self,
        post_id: &str,
        author_handle: &str,
    ) -> Result<PostMetadata, PipelineError>;
}

#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, media_url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Speech-to-text over raw audio/video bytes.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, data: Vec<u8>, filename: &str) -> Result<Transcript, PipelineError>;
}

/// Which part of the analysis a request asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisScope {
    /// Ad-level fields plus per-shot fields for the given shots
    Full,
    /// Per-shot fields only, for follow-up chunks of a long ad
    ShotsOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub full_transcript: &'a str,
    pub post_text: &'a str,
    pub shots: &'a [Shot],
    pub scope: AnalysisScope,
}

/// Best-effort creative analysis. Any failure yields `None`.
#[async_trait]
pub trait CreativeAnalyzer: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Option<AdAnalysis>;
}
