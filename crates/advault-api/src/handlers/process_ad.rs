//! Ingestion endpoints

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use advault_core::models::Ad;
use advault_core::{AppError, ErrorMetadata, IngestError};
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProcessAdRequest {
    #[serde(default)]
    #[validate(length(max = 2048, message = "URL must be at most 2048 characters"))]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessAdResponse {
    pub success: bool,
    pub id: String,
    pub title: String,
    pub creator: String,
    pub transcript_length: usize,
    pub shots_count: usize,
    pub analysis_available: bool,
}

impl From<&Ad> for ProcessAdResponse {
    fn from(ad: &Ad) -> Self {
        Self {
            success: true,
            id: ad.id.clone(),
            title: ad.title.clone(),
            creator: ad.creator.clone(),
            transcript_length: ad.full_transcript.chars().count(),
            shots_count: ad.shots.len(),
            analysis_available: !ad.why_it_worked.analysis_failed(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProcessAdsBatchRequest {
    #[validate(length(min = 1, max = 20, message = "Provide between 1 and 20 URLs"))]
    pub urls: Vec<String>,
}

/// Outcome for one URL of a batch
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchItemResult {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<ProcessAdResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl BatchItemResult {
    fn from_result(url: String, result: Result<Ad, IngestError>) -> Self {
        match result {
            Ok(ad) => Self {
                url,
                success: true,
                ad: Some(ProcessAdResponse::from(&ad)),
                error: None,
                code: None,
                stage: None,
            },
            Err(e) => Self {
                url,
                success: false,
                ad: None,
                error: Some(e.client_message()),
                code: Some(e.error_code().to_string()),
                stage: Some(e.stage.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessAdsBatchResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

#[utoipa::path(
    post,
    path = "/api/process-ad",
    tag = "ingest",
    request_body = ProcessAdRequest,
    responses(
        (status = 200, description = "Ad ingested", body = ProcessAdResponse),
        (status = 400, description = "Missing or invalid URL", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 409, description = "Ad already exists", body = ErrorResponse),
        (status = 422, description = "Post has no video", body = ErrorResponse),
        (status = 502, description = "Upstream service failed", body = ErrorResponse),
        (status = 504, description = "Stage timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "process_ad"))]
pub async fn process_ad(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ProcessAdRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidInput("URL is required".to_string()))?;

    let ad = state.pipeline.ingest(url).await?;

    Ok(Json(ProcessAdResponse::from(&ad)))
}

#[utoipa::path(
    post,
    path = "/api/process-ads-batch",
    tag = "ingest",
    request_body = ProcessAdsBatchRequest,
    responses(
        (status = 200, description = "Per-URL results, in request order", body = ProcessAdsBatchResponse),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "process_ads_batch"))]
pub async fn process_ads_batch(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ProcessAdsBatchRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let urls: Vec<String> = request.urls.iter().map(|u| u.trim().to_string()).collect();
    let results = state.pipeline.ingest_batch(urls.clone()).await;

    let results: Vec<BatchItemResult> = urls
        .into_iter()
        .zip(results)
        .map(|(url, result)| BatchItemResult::from_result(url, result))
        .collect();
    let succeeded = results.iter().filter(|r| r.success).count();

    tracing::info!(
        succeeded,
        failed = results.len() - succeeded,
        "Batch ingestion finished"
    );

    Ok(Json(ProcessAdsBatchResponse {
        succeeded,
        failed: results.len() - succeeded,
        results,
    }))
}
