//! Serves stored videos under `/storage/{key}`.

use crate::error::HttpAppError;
use crate::state::AppState;
use advault_core::AppError;
use advault_storage::keys::validate_key;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

/// Keys embed the post id, so content under a key never changes
const CACHE_CONTROL: &str = "public, max-age=31536000";

#[tracing::instrument(skip(state), fields(operation = "get_stored_file"))]
pub async fn get_stored_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, HttpAppError> {
    validate_key(&key)?;

    let object = state
        .storage
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let content_length = object.data.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .body(Body::from(object.data))
        .map_err(|e| HttpAppError::from(AppError::Internal(e.to_string())))
}
