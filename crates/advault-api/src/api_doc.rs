//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use advault_core::models;
use advault_core::IngestStage;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Advault API",
        version = "0.1.0",
        description = "Ingest short-form video ads from social posts: download, transcribe, break into shots, analyze and store."
    ),
    paths(
        handlers::process_ad::process_ad,
        handlers::process_ad::process_ads_batch,
        handlers::ads::get_ad,
        handlers::health::health_check,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::process_ad::ProcessAdRequest,
        handlers::process_ad::ProcessAdResponse,
        handlers::process_ad::ProcessAdsBatchRequest,
        handlers::process_ad::ProcessAdsBatchResponse,
        handlers::process_ad::BatchItemResult,
        handlers::health::HealthCheckResponse,
        models::Ad,
        models::AdType,
        models::Hook,
        models::Tactic,
        models::WhyItWorked,
        models::Shot,
        models::ShotType,
        IngestStage,
    )),
    tags(
        (name = "ingest", description = "Ad ingestion"),
        (name = "ads", description = "Stored ads"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
