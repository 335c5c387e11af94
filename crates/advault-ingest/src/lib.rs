//! Advault Ingest Library
//!
//! Turns a social-media post URL into a stored, analyzed ad:
//! URL resolution, metadata fetch, download, upload, transcription, shot
//! building, creative analysis, merge and persistence.
//!
//! Every external system sits behind a trait in [`traits`] so the
//! orchestrator can be driven by fakes in tests.

pub mod downloader;
pub mod fxtwitter;
pub mod gemini;
pub mod merge;
pub mod pipeline;
pub mod post_url;
pub mod shots;
pub mod traits;
pub mod whisper;

pub use downloader::HttpDownloader;
pub use fxtwitter::FxTwitterClient;
pub use gemini::GeminiAnalyzer;
pub use merge::{assemble_ad, AdDraft};
pub use pipeline::{IngestPipeline, PipelineOptions};
pub use post_url::resolve;
pub use shots::build_shots;
pub use traits::{
    AnalysisRequest, AnalysisScope, CreativeAnalyzer, MediaDownloader, PostMetadataFetcher,
    Transcriber,
};
pub use whisper::WhisperClient;
