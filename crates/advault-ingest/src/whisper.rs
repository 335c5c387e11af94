//! Transcription adapter over the OpenAI Whisper API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use advault_core::models::{Transcript, TranscriptSegment};
use advault_core::PipelineError;

use crate::traits::Transcriber;

/// MIME type sent with the upload, from the file extension.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "webm" => "video/webm",
        "m4a" => "audio/m4a",
        "ogg" => "audio/ogg",
        _ => "video/mp4",
    }
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

pub struct WhisperClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Debug for WhisperClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("WhisperClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WhisperClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Whisper API")?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn transport_error(e: impl std::fmt::Display) -> PipelineError {
        PipelineError::TranscriptionFailed {
            status: 0,
            body: e.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    #[tracing::instrument(skip(self, data), fields(size = data.len(), model = %self.model))]
    async fn transcribe(&self, data: Vec<u8>, filename: &str) -> Result<Transcript, PipelineError> {
        let file = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(mime_for_filename(filename))
            .map_err(Self::transport_error)?;

        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        let response = self
            .http_client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, "Whisper API request failed");
            return Err(PipelineError::TranscriptionFailed {
                status: status.as_u16(),
                body,
            });
        }

        let result: VerboseTranscription = response.json().await.map_err(|e| {
            PipelineError::TranscriptionFailed {
                status: status.as_u16(),
                body: format!("Failed to parse Whisper response: {}", e),
            }
        })?;

        let segments: Vec<TranscriptSegment> = result
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
            })
            .collect();

        tracing::debug!(
            segments = segments.len(),
            language = ?result.language,
            "Transcription complete"
        );

        Ok(Transcript {
            full_transcript: result.text,
            segments,
            language: result.language,
            duration: result.duration,
        })
    }
}
