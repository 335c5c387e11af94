//! Post-metadata fetcher backed by the FxTwitter read API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use advault_core::models::PostMetadata;
use advault_core::PipelineError;

use crate::traits::PostMetadataFetcher;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct FxResponse {
    code: u16,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    tweet: Option<FxTweet>,
}

#[derive(Debug, Deserialize)]
struct FxTweet {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    author: Option<FxAuthor>,
    #[serde(default)]
    media: Option<FxMedia>,
}

#[derive(Debug, Deserialize)]
struct FxAuthor {
    #[serde(default)]
    screen_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FxMedia {
    #[serde(default)]
    videos: Vec<FxVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FxVideo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub formats: Vec<FxVideoFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FxVideoFormat {
    pub url: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub bitrate: Option<u64>,
}

/// Pick the highest-bitrate MP4 encoding, the first encoding when none is
/// MP4, or the video's own URL when it lists no encodings.
///
/// Ties keep the earliest format so the choice is stable for identical input.
pub fn select_video_url(video: &FxVideo) -> Option<String> {
    let best_mp4 = video
        .formats
        .iter()
        .filter(|f| {
            f.container
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("mp4"))
        })
        .fold(None::<&FxVideoFormat>, |best, f| match best {
            Some(b) if b.bitrate.unwrap_or(0) >= f.bitrate.unwrap_or(0) => Some(b),
            _ => Some(f),
        });

    best_mp4
        .or_else(|| video.formats.first())
        .map(|f| f.url.clone())
        .or_else(|| video.url.clone())
        .filter(|url| !url.is_empty())
}

pub struct FxTwitterClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for FxTwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FxTwitterClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl FxTwitterClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client for FxTwitter API")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PostMetadataFetcher for FxTwitterClient {
    #[tracing::instrument(skip(self), fields(api = "fxtwitter"))]
    async fn fetch_metadata(
        &self,
        post_id: &str,
        author_handle: &str,
    ) -> Result<PostMetadata, PipelineError> {
        let url = format!("{}/{}/status/{}", self.base_url, author_handle, post_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::FetchFailed(format!("HTTP {}", status.as_u16())));
        }

        let body: FxResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::FetchFailed(format!("Invalid response body: {}", e)))?;

        if body.code != 200 {
            return Err(PipelineError::PostNotFound(
                body.message.unwrap_or_else(|| format!("code {}", body.code)),
            ));
        }

        let tweet = body
            .tweet
            .ok_or_else(|| PipelineError::PostNotFound("Response has no post".to_string()))?;

        let media_url = tweet
            .media
            .as_ref()
            .and_then(|m| m.videos.first())
            .and_then(select_video_url)
            .ok_or(PipelineError::NoVideoInPost)?;

        let screen_name = tweet
            .author
            .as_ref()
            .and_then(|a| a.screen_name.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| author_handle.to_string());
        let display_name = tweet
            .author
            .as_ref()
            .and_then(|a| a.name.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| author_handle.to_string());

        tracing::debug!(post_id = %post_id, media_url = %media_url, "Fetched post metadata");

        Ok(PostMetadata {
            text: tweet.text.unwrap_or_default(),
            media_url,
            author_handle: screen_name,
            author_display_name: display_name,
        })
    }
}
