//! Test helpers: build AppState and router over in-memory stores and fake
//! upstream services.

use std::sync::Arc;

use advault_api::setup::routes;
use advault_api::state::AppState;
use advault_core::models::{AdAnalysis, PostMetadata, Transcript, TranscriptSegment};
use advault_core::PipelineError;
use advault_db::MemoryAdStore;
use advault_ingest::{
    AnalysisRequest, CreativeAnalyzer, IngestPipeline, MediaDownloader, PipelineOptions,
    PostMetadataFetcher, Transcriber,
};
use advault_storage::MockStorage;
use async_trait::async_trait;
use axum_test::TestServer;

/// Post id the fake metadata API reports as deleted
pub const MISSING_POST_ID: &str = "404";
/// Post id whose fake post has no video
pub const TEXT_ONLY_POST_ID: &str = "422";

pub struct FakeFetcher;

#[async_trait]
impl PostMetadataFetcher for FakeFetcher {
    async fn fetch_metadata(
        &self,
        post_id: &str,
        author_handle: &str,
    ) -> Result<PostMetadata, PipelineError> {
        match post_id {
            MISSING_POST_ID => Err(PipelineError::PostNotFound("NOT_FOUND".to_string())),
            TEXT_ONLY_POST_ID => Err(PipelineError::NoVideoInPost),
            _ => Ok(PostMetadata {
                text: "Buy now".to_string(),
                media_url: format!("https://video.test/{}.mp4", post_id),
                author_handle: author_handle.to_string(),
                author_display_name: author_handle.to_string(),
            }),
        }
    }
}

pub struct FakeDownloader;

#[async_trait]
impl MediaDownloader for FakeDownloader {
    async fn download(&self, _media_url: &str) -> Result<Vec<u8>, PipelineError> {
        Ok(b"fake mp4".to_vec())
    }
}

pub struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _data: Vec<u8>, _filename: &str) -> Result<Transcript, PipelineError> {
        Ok(Transcript {
            full_transcript: "Hello world".to_string(),
            segments: vec![
                TranscriptSegment {
                    start: 0.0,
                    end: 2.5,
                    text: "Hello".to_string(),
                },
                TranscriptSegment {
                    start: 2.5,
                    end: 5.0,
                    text: "world".to_string(),
                },
            ],
            language: Some("english".to_string()),
            duration: Some(5.0),
        })
    }
}

pub struct FakeAnalyzer;

#[async_trait]
impl CreativeAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _request: AnalysisRequest<'_>) -> Option<AdAnalysis> {
        Some(AdAnalysis {
            title: Some("Greeting Ad".to_string()),
            ad_type: Some("Organic".to_string()),
            tags: vec!["demo".to_string()],
            ..Default::default()
        })
    }
}

/// Test application: server plus handles on the in-memory stores.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryAdStore>,
    pub storage: Arc<MockStorage>,
}

pub fn setup_test_app() -> TestApp {
    let store = Arc::new(MemoryAdStore::new());
    let storage = Arc::new(MockStorage::new());

    let pipeline = IngestPipeline::new(
        Arc::new(FakeFetcher),
        Arc::new(FakeDownloader),
        Arc::new(FakeTranscriber),
        Some(Arc::new(FakeAnalyzer)),
        storage.clone(),
        store.clone(),
        PipelineOptions::default(),
    );
    let state = Arc::new(AppState::new(
        Arc::new(pipeline),
        store.clone(),
        storage.clone(),
    ));

    let server = TestServer::new(routes::api_router(state)).expect("Failed to start test server");

    TestApp {
        server,
        store,
        storage,
    }
}
