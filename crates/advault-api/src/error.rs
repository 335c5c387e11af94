//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that
//! converts into `AppError` (store, storage and ingest errors included) can be
//! propagated with `?` and renders with the same status, body and logging.

use advault_core::{AppError, ErrorMetadata, IngestError, LogLevel};
use advault_db::StoreError;
use advault_storage::StorageError;
use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use utoipa::ToSchema;
use validator::Validate;

static PRODUCTION: AtomicBool = AtomicBool::new(false);

/// Production mode hides error details and types from clients. Set once at
/// startup from `Config::is_production()`.
pub fn set_production_mode(production: bool) {
    PRODUCTION.store(production, Ordering::Relaxed);
}

fn is_production() -> bool {
    PRODUCTION.load(Ordering::Relaxed)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    /// Pipeline stage that failed, for ingestion errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, with_details: bool) -> Self {
        let stage = match app_error {
            AppError::Ingest(e) => Some(e.stage.to_string()),
            _ => None,
        };

        Self {
            error: app_error.client_message(),
            details: with_details.then(|| app_error.detailed_message()),
            error_type: with_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            stage,
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: both the trait and AppError live in other crates)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<IngestError> for HttpAppError {
    fn from(err: IngestError) -> Self {
        HttpAppError(AppError::Ingest(err))
    }
}

impl From<StoreError> for HttpAppError {
    fn from(err: StoreError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(key) => {
                HttpAppError(AppError::InvalidInput(format!("Invalid storage key: {}", key)))
            }
            other => HttpAppError(AppError::Storage(other.to_string())),
        }
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that deserializes then runs the body's `Validate`
/// rules. Both failures render as 400 with our ErrorResponse format.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        inner.validate().map_err(|e| {
            HttpAppError(AppError::InvalidInput(format!("Invalid request body: {}", e)))
        })?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details only outside production and only for non-sensitive errors
        let with_details = !is_production() && !app_error.is_sensitive();
        let body = Json(ErrorResponse::from_app_error(app_error, with_details));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advault_core::{IngestStage, PipelineError};
    use axum::body::{to_bytes, Body};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct RenameBody {
        #[validate(length(min = 1, message = "name must not be empty"))]
        name: String,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_validated_json_runs_validation_rules() {
        let err = ValidatedJson::<RenameBody>::from_request(json_request(r#"{"name":""}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.0.http_status_code(), 400);
        assert!(err.0.client_message().contains("name must not be empty"));

        let ValidatedJson(body) =
            ValidatedJson::<RenameBody>::from_request(json_request(r#"{"name":"ok"}"#), &())
                .await
                .unwrap();
        assert_eq!(body.name, "ok");
    }

    #[tokio::test]
    async fn test_production_mode_hides_details() {
        async fn render() -> serde_json::Value {
            let response =
                HttpAppError::from(AppError::InvalidInput("bad url".into())).into_response();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }

        set_production_mode(true);
        let hidden = render().await;
        set_production_mode(false);
        let shown = render().await;

        assert_eq!(hidden["error"], "bad url");
        assert!(hidden.get("details").is_none());
        assert!(hidden.get("error_type").is_none());
        assert!(shown.get("details").is_some());
    }

    #[test]
    fn test_ingest_error_body_carries_stage_and_hides_upstream_body() {
        let err = IngestError::new(
            IngestStage::Transcribing,
            PipelineError::TranscriptionFailed {
                status: 500,
                body: "secret upstream payload".to_string(),
            },
        );
        let app_error = AppError::Ingest(err);
        let body = ErrorResponse::from_app_error(&app_error, !app_error.is_sensitive());

        assert_eq!(body.stage.as_deref(), Some("transcribing"));
        assert_eq!(body.code, "TRANSCRIPTION_FAILED");
        assert!(!body.error.contains("secret upstream payload"));
        assert!(body.details.is_none());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (HttpAppError::from(AppError::NotFound("x".into())), 404),
            (
                HttpAppError::from(IngestError::new(
                    IngestStage::CheckingDuplicate,
                    PipelineError::AlreadyExists("1".into()),
                )),
                409,
            ),
            (
                HttpAppError::from(StorageError::InvalidKey("../x".into())),
                400,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status().as_u16(), status);
        }
    }
}
