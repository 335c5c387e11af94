//! Ingestion orchestrator
//!
//! Runs one post URL through every stage in strict sequence and persists the
//! assembled ad. Each run owns its own [`PipelineState`]; the record store's
//! uniqueness constraint is the only coordination between concurrent runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use advault_core::models::{
    Ad, AdAnalysis, PostMetadata, PostReference, Shot, MAX_SHOTS_PER_CALL,
};
use advault_core::{IngestConfig, IngestError, IngestStage, PipelineError, PipelineState};
use advault_db::AdStore;
use advault_storage::keys::{public_path, video_key};
use advault_storage::Storage;

use crate::downloader::HttpDownloader;
use crate::fxtwitter::FxTwitterClient;
use crate::gemini::GeminiAnalyzer;
use crate::merge::{assemble_ad, AdDraft};
use crate::post_url;
use crate::shots::build_shots;
use crate::traits::{
    AnalysisRequest, AnalysisScope, CreativeAnalyzer, MediaDownloader, PostMetadataFetcher,
    Transcriber,
};
use crate::whisper::WhisperClient;

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Per-stage limits and batch settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub fetch_timeout: Duration,
    pub download_timeout: Duration,
    pub transcribe_timeout: Duration,
    pub analyze_timeout: Duration,
    /// Maximum shots sent to the analyzer in one call, never more than
    /// [`MAX_SHOTS_PER_CALL`]
    pub analysis_chunk_size: usize,
    pub batch_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

impl From<&IngestConfig> for PipelineOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            download_timeout: config.download_timeout(),
            transcribe_timeout: config.transcribe_timeout(),
            analyze_timeout: config.analyze_timeout(),
            analysis_chunk_size: config.analysis_chunk_size,
            batch_concurrency: config.batch_concurrency,
        }
    }
}

/// State machine bookkeeping for one ingestion.
struct Run {
    state: PipelineState,
}

impl Run {
    fn new() -> Self {
        Self {
            state: PipelineState::start(),
        }
    }

    fn stage(&self) -> IngestStage {
        self.state.stage().unwrap_or(IngestStage::Persisting)
    }

    fn advance(&mut self) {
        match self.state.advance() {
            Ok(next) => {
                if let Some(stage) = next.stage() {
                    tracing::debug!(stage = %stage, "Entering stage");
                }
                self.state = next;
            }
            Err(e) => tracing::error!(error = %e, "Invalid pipeline transition"),
        }
    }

    fn fail(&mut self, kind: PipelineError) -> IngestError {
        let stage = self.stage();
        if let Ok(failed) = self.state.fail(kind.to_string()) {
            self.state = failed;
        }
        IngestError::new(stage, kind)
    }
}

async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(PipelineError::Timeout {
                after_secs: limit.as_secs(),
            })),
        None => fut.await,
    }
}

pub struct IngestPipeline {
    fetcher: Arc<dyn PostMetadataFetcher>,
    downloader: Arc<dyn MediaDownloader>,
    transcriber: Arc<dyn Transcriber>,
    analyzer: Option<Arc<dyn CreativeAnalyzer>>,
    storage: Arc<dyn Storage>,
    store: Arc<dyn AdStore>,
    options: PipelineOptions,
}

impl IngestPipeline {
    pub fn new(
        fetcher: Arc<dyn PostMetadataFetcher>,
        downloader: Arc<dyn MediaDownloader>,
        transcriber: Arc<dyn Transcriber>,
        analyzer: Option<Arc<dyn CreativeAnalyzer>>,
        storage: Arc<dyn Storage>,
        store: Arc<dyn AdStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            downloader,
            transcriber,
            analyzer,
            storage,
            store,
            options,
        }
    }

    /// Wire the HTTP-backed collaborators from configuration.
    ///
    /// Analysis is disabled when no Gemini key is configured.
    pub fn from_config(
        config: &IngestConfig,
        storage: Arc<dyn Storage>,
        store: Arc<dyn AdStore>,
    ) -> Result<Self> {
        let fetcher = FxTwitterClient::new(&config.fxtwitter_base_url, config.fetch_timeout())?;
        let downloader =
            HttpDownloader::new(config.max_video_size_bytes, config.download_timeout())?;
        let transcriber = WhisperClient::new(
            &config.openai_api_key,
            &config.whisper_model,
            &config.openai_base_url,
            config.transcribe_timeout(),
        )?;
        let analyzer: Option<Arc<dyn CreativeAnalyzer>> = match &config.gemini_api_key {
            Some(key) => Some(Arc::new(GeminiAnalyzer::new(
                key,
                &config.gemini_model,
                &config.gemini_base_url,
                config.analyze_timeout(),
            )?)),
            None => {
                tracing::warn!("GEMINI_API_KEY not set, creative analysis disabled");
                None
            }
        };

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(downloader),
            Arc::new(transcriber),
            analyzer,
            storage,
            store,
            PipelineOptions::from(config),
        ))
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn analysis_enabled(&self) -> bool {
        self.analyzer.is_some()
    }

    pub async fn ingest(&self, url: &str) -> Result<Ad, IngestError> {
        self.ingest_with_cancel(url, CancellationToken::new()).await
    }

    /// Ingest one post. Cancelling `cancel` fails the run at whatever stage it
    /// is in; nothing is persisted in that case.
    pub async fn ingest_with_cancel(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<Ad, IngestError> {
        let span = tracing::info_span!(
            "ingest",
            run_id = %Uuid::new_v4(),
            url = %url,
            post_id = tracing::field::Empty,
        );

        async move {
            let mut run = Run::new();
            let result = self.run(&mut run, url, &cancel).await;
            match &result {
                Ok(ad) => tracing::info!(
                    ad_id = %ad.id,
                    shots = ad.shots.len(),
                    needs_review = ad.needs_review(),
                    "Ingestion complete"
                ),
                Err(e) => log_failure(e),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Ingest several URLs with bounded concurrency. Results keep input order.
    pub async fn ingest_batch(&self, urls: Vec<String>) -> Vec<Result<Ad, IngestError>> {
        let concurrency = self.options.batch_concurrency.max(1);
        stream::iter(urls)
            .map(|url| async move { self.ingest(&url).await })
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Run one network or storage step, failing the run on error, timeout or
    /// cancellation.
    async fn step<T, F>(
        &self,
        run: &mut Run,
        cancel: &CancellationToken,
        limit: Option<Duration>,
        fut: F,
    ) -> Result<T, IngestError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = with_timeout(limit, fut) => result,
        };
        result.map_err(|kind| run.fail(kind))
    }

    async fn run(
        &self,
        run: &mut Run,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Ad, IngestError> {
        // Resolving
        let post: PostReference = match post_url::resolve(url) {
            Some(post) => post,
            None => return Err(run.fail(PipelineError::InvalidUrl(url.to_string()))),
        };
        tracing::Span::current().record("post_id", post.post_id.as_str());
        run.advance();

        // FetchingMetadata
        let metadata: PostMetadata = self
            .step(
                run,
                cancel,
                Some(self.options.fetch_timeout),
                self.fetcher
                    .fetch_metadata(&post.post_id, &post.author_handle),
            )
            .await?;
        run.advance();

        // CheckingDuplicate
        let exists = self
            .step(run, cancel, None, async {
                self.store
                    .ad_exists(&post.post_id)
                    .await
                    .map_err(|e| PipelineError::PersistFailed(e.to_string()))
            })
            .await?;
        if exists {
            return Err(run.fail(PipelineError::AlreadyExists(post.post_id.clone())));
        }
        run.advance();

        // Downloading
        let video = self
            .step(
                run,
                cancel,
                Some(self.options.download_timeout),
                self.downloader.download(&metadata.media_url),
            )
            .await?;
        run.advance();

        // Uploading
        let key = video_key(&post.post_id);
        let stored_key = self
            .step(run, cancel, None, async {
                self.storage
                    .put(&key, video.clone(), VIDEO_CONTENT_TYPE)
                    .await
                    .map_err(|e| PipelineError::StorageFailed(e.to_string()))
            })
            .await?;
        run.advance();

        // Transcribing
        let filename = format!("{}.mp4", post.post_id);
        let transcript = self
            .step(
                run,
                cancel,
                Some(self.options.transcribe_timeout),
                self.transcriber.transcribe(video, &filename),
            )
            .await?;
        run.advance();

        // BuildingShots
        let shots = build_shots(&transcript.segments);
        if shots.is_empty() {
            tracing::warn!(
                post_id = %post.post_id,
                "Transcript has no segments, ad will be stored without shots and flagged for review"
            );
        }
        run.advance();

        // Analyzing
        let analysis = match self
            .analyze(&transcript.full_transcript, &metadata.text, &shots, cancel)
            .await
        {
            Ok(analysis) => analysis,
            Err(kind) => return Err(run.fail(kind)),
        };
        run.advance();

        // Merging
        let ad = assemble_ad(
            AdDraft {
                post_id: post.post_id.clone(),
                source_url: url.trim().to_string(),
                video_src: public_path(&stored_key),
                author_handle: metadata.author_handle.clone(),
                full_transcript: transcript.full_transcript,
                shots,
                date_added: chrono::Utc::now().date_naive(),
            },
            analysis,
        );
        run.advance();

        // Persisting. Not cancellable once the write starts.
        if cancel.is_cancelled() {
            return Err(run.fail(PipelineError::Cancelled));
        }
        match self.store.create_ad(&ad).await {
            Ok(_) => {
                run.advance();
                Ok(ad)
            }
            Err(e) if e.is_conflict() => {
                tracing::info!(post_id = %post.post_id, "Lost the race to a concurrent ingestion");
                Err(run.fail(PipelineError::AlreadyExists(post.post_id)))
            }
            Err(e) => {
                self.discard_video(&post.post_id, &stored_key).await;
                Err(run.fail(PipelineError::PersistFailed(e.to_string())))
            }
        }
    }

    /// Best-effort creative analysis, chunked by `analysis_chunk_size`.
    ///
    /// The first chunk asks for the full ad-level analysis; if it fails the
    /// whole analysis is unavailable. Later chunks only add per-shot fields
    /// and a failed later chunk only loses its own shots. The only error is
    /// `Cancelled`.
    async fn analyze(
        &self,
        full_transcript: &str,
        post_text: &str,
        shots: &[Shot],
        cancel: &CancellationToken,
    ) -> Result<Option<AdAnalysis>, PipelineError> {
        let Some(analyzer) = &self.analyzer else {
            tracing::info!("Creative analysis disabled, using placeholders");
            return Ok(None);
        };

        let chunk_size = self.options.analysis_chunk_size.clamp(1, MAX_SHOTS_PER_CALL);
        let chunks: Vec<&[Shot]> = if shots.is_empty() {
            vec![shots]
        } else {
            shots.chunks(chunk_size).collect()
        };
        let chunk_count = chunks.len();

        let mut merged: Option<AdAnalysis> = None;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let scope = if index == 0 {
                AnalysisScope::Full
            } else {
                AnalysisScope::ShotsOnly
            };
            let request = AnalysisRequest {
                full_transcript,
                post_text,
                shots: chunk,
                scope,
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                result = tokio::time::timeout(self.options.analyze_timeout, analyzer.analyze(request)) => result,
            };

            let analysis = match result {
                Ok(Some(analysis)) => analysis,
                Ok(None) => {
                    tracing::warn!(chunk = index + 1, chunk_count, "Analysis chunk returned nothing");
                    if index == 0 {
                        return Ok(None);
                    }
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        chunk = index + 1,
                        chunk_count,
                        timeout_secs = self.options.analyze_timeout.as_secs(),
                        "Analysis chunk timed out"
                    );
                    if index == 0 {
                        return Ok(None);
                    }
                    continue;
                }
            };

            match merged.as_mut() {
                Some(existing) => existing.absorb(AdAnalysis {
                    shots: analysis.shots,
                    ..Default::default()
                }),
                None => merged = Some(analysis),
            }
        }

        Ok(merged)
    }

    /// Removes the video uploaded by a run whose save failed.
    ///
    /// Every run of a post writes the same key, so the blob is only removed
    /// when no record for the post exists. If that cannot be confirmed the
    /// blob is kept: an orphan is harmless, a dangling `videoSrc` is not.
    async fn discard_video(&self, post_id: &str, key: &str) {
        match self.store.ad_exists(post_id).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::info!(
                    post_id = %post_id,
                    key = %key,
                    "Keeping uploaded video, another ingestion saved this post"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    post_id = %post_id,
                    key = %key,
                    error = %e,
                    "Keeping uploaded video, could not check for an existing record"
                );
                return;
            }
        }

        match self.storage.delete(key).await {
            Ok(()) => tracing::info!(key = %key, "Removed uploaded video after failed save"),
            Err(e) => tracing::warn!(
                key = %key,
                error = %e,
                "Failed to remove uploaded video after failed save"
            ),
        }
    }
}

fn log_failure(err: &IngestError) {
    use advault_core::{ErrorMetadata, LogLevel};

    let stage = err.stage.as_str();
    let error_type = err.kind.error_type();
    match err.log_level() {
        LogLevel::Error => tracing::error!(stage, error_type, error = %err, "Ingestion failed"),
        LogLevel::Warn => tracing::warn!(stage, error_type, error = %err, "Ingestion failed"),
        LogLevel::Debug => tracing::debug!(stage, error_type, error = %err, "Ingestion failed"),
    }
}
