//! Configuration module
//!
//! Server, database, blob storage and ingestion settings, all read from the
//! environment (optionally seeded from a `.env` file).

use std::env;
use std::time::Duration;

use crate::models::MAX_SHOTS_PER_CALL;
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const LOCAL_STORAGE_PATH: &str = "./storage";
const S3_REGION: &str = "us-east-1";
const WHISPER_MODEL: &str = "whisper-1";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const FXTWITTER_BASE_URL: &str = "https://api.fxtwitter.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MAX_VIDEO_SIZE_MB: u64 = 200;
const FETCH_TIMEOUT_SECS: u64 = 30;
const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const TRANSCRIBE_TIMEOUT_SECS: u64 = 600;
const ANALYZE_TIMEOUT_SECS: u64 = 120;
const ANALYSIS_CHUNK_SIZE: usize = 25;
const BATCH_CONCURRENCY: usize = 4;

/// Settings shared by every binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// External API credentials, endpoints and per-stage limits for ingestion.
#[derive(Clone)]
pub struct IngestConfig {
    pub openai_api_key: String,
    pub whisper_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub fxtwitter_base_url: String,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub max_video_size_bytes: u64,
    pub fetch_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub transcribe_timeout_secs: u64,
    pub analyze_timeout_secs: u64,
    pub analysis_chunk_size: usize,
    pub batch_concurrency: usize,
}

impl std::fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestConfig")
            .field("openai_api_key", &"[REDACTED]")
            .field("whisper_model", &self.whisper_model)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("fxtwitter_base_url", &self.fxtwitter_base_url)
            .field("max_video_size_bytes", &self.max_video_size_bytes)
            .field("analysis_chunk_size", &self.analysis_chunk_size)
            .finish()
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            whisper_model: WHISPER_MODEL.to_string(),
            gemini_api_key: None,
            gemini_model: GEMINI_MODEL.to_string(),
            fxtwitter_base_url: FXTWITTER_BASE_URL.to_string(),
            openai_base_url: OPENAI_BASE_URL.to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            fetch_timeout_secs: FETCH_TIMEOUT_SECS,
            download_timeout_secs: DOWNLOAD_TIMEOUT_SECS,
            transcribe_timeout_secs: TRANSCRIBE_TIMEOUT_SECS,
            analyze_timeout_secs: ANALYZE_TIMEOUT_SECS,
            analysis_chunk_size: ANALYSIS_CHUNK_SIZE,
            batch_concurrency: BATCH_CONCURRENCY,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY must be set for transcription"))?,
            whisper_model: env::var("WHISPER_MODEL").unwrap_or_else(|_| WHISPER_MODEL.to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_MODEL.to_string()),
            fxtwitter_base_url: env::var("FXTWITTER_BASE_URL")
                .unwrap_or_else(|_| FXTWITTER_BASE_URL.to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OPENAI_BASE_URL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| GEMINI_BASE_URL.to_string()),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(FETCH_TIMEOUT_SECS),
            download_timeout_secs: env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| DOWNLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_TIMEOUT_SECS),
            transcribe_timeout_secs: env::var("TRANSCRIBE_TIMEOUT_SECS")
                .unwrap_or_else(|_| TRANSCRIBE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCRIBE_TIMEOUT_SECS),
            analyze_timeout_secs: env::var("ANALYZE_TIMEOUT_SECS")
                .unwrap_or_else(|_| ANALYZE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(ANALYZE_TIMEOUT_SECS),
            analysis_chunk_size: env::var("ANALYSIS_CHUNK_SIZE")
                .unwrap_or_else(|_| ANALYSIS_CHUNK_SIZE.to_string())
                .parse()
                .unwrap_or(ANALYSIS_CHUNK_SIZE),
            batch_concurrency: env::var("BATCH_CONCURRENCY")
                .unwrap_or_else(|_| BATCH_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(BATCH_CONCURRENCY),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.openai_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("OPENAI_API_KEY must not be empty"));
        }
        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than 0"));
        }
        for (name, secs) in [
            ("FETCH_TIMEOUT_SECS", self.fetch_timeout_secs),
            ("DOWNLOAD_TIMEOUT_SECS", self.download_timeout_secs),
            ("TRANSCRIBE_TIMEOUT_SECS", self.transcribe_timeout_secs),
            ("ANALYZE_TIMEOUT_SECS", self.analyze_timeout_secs),
        ] {
            if secs == 0 {
                return Err(anyhow::anyhow!("{} must be greater than 0", name));
            }
        }
        if self.analysis_chunk_size == 0 || self.analysis_chunk_size > MAX_SHOTS_PER_CALL {
            return Err(anyhow::anyhow!(
                "ANALYSIS_CHUNK_SIZE must be between 1 and {}, larger chunks overflow the analysis output budget",
                MAX_SHOTS_PER_CALL
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(anyhow::anyhow!("BATCH_CONCURRENCY must be greater than 0"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn transcribe_timeout(&self) -> Duration {
        Duration::from_secs(self.transcribe_timeout_secs)
    }

    pub fn analyze_timeout(&self) -> Duration {
        Duration::from_secs(self.analyze_timeout_secs)
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: String,
    pub ingest: IngestConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn as_app(&self) -> &AppConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_app().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_app().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.as_app().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_app().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_app().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_app().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_app().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.as_app().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_app().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_app().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> &str {
        &self.as_app().s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_app().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_app().local_storage_path
    }

    pub fn ingest(&self) -> &IngestConfig {
        &self.as_app().ingest
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DATABASE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Local,
        };

        Ok(AppConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| S3_REGION.to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| LOCAL_STORAGE_PATH.to_string()),
            ingest: IngestConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.is_none() {
            return Err(anyhow::anyhow!(
                "S3_BUCKET must be set when using S3 storage backend"
            ));
        }

        self.ingest.validate()
    }
}
