//! Media downloader with a hard size cap.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use advault_core::PipelineError;

use crate::traits::MediaDownloader;

#[derive(Debug)]
pub struct HttpDownloader {
    http_client: reqwest::Client,
    max_bytes: u64,
}

impl HttpDownloader {
    pub fn new(max_bytes: u64, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for media downloads")?;

        Ok(Self {
            http_client,
            max_bytes,
        })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

#[async_trait]
impl MediaDownloader for HttpDownloader {
    #[tracing::instrument(skip(self), fields(max_bytes = self.max_bytes))]
    async fn download(&self, media_url: &str) -> Result<Vec<u8>, PipelineError> {
        let mut response = self
            .http_client
            .get(media_url)
            .send()
            .await
            .map_err(|e| PipelineError::DownloadFailed {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::download_status(status.as_u16()));
        }

        let too_large = PipelineError::MediaTooLarge {
            limit_bytes: self.max_bytes,
        };

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                tracing::warn!(content_length = length, "Video exceeds download limit");
                return Err(too_large);
            }
        }

        let mut data = Vec::with_capacity(
            response
                .content_length()
                .map(|l| l as usize)
                .unwrap_or_default(),
        );
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            PipelineError::DownloadFailed {
                status: Some(status.as_u16()),
                message: e.to_string(),
            }
        })? {
            if (data.len() + chunk.len()) as u64 > self.max_bytes {
                tracing::warn!(received = data.len(), "Video exceeded download limit mid-stream");
                return Err(too_large);
            }
            data.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = data.len(), "Downloaded video");
        Ok(data)
    }
}
