use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use advault_core::models::Ad;
use advault_core::AppError;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/ads/{id}",
    tag = "ads",
    params(
        ("id" = String, Path, description = "Ad ID (source post id)")
    ),
    responses(
        (status = 200, description = "Ad found", body = Ad),
        (status = 404, description = "Ad not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_ad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let ad = state
        .store
        .get_ad_by_id(&id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, ad_id = %id, "Failed to fetch ad");
            HttpAppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("Ad not found".to_string()))?;

    Ok(Json(ad))
}
