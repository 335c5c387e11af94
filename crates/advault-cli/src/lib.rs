use advault_core::models::Ad;
use advault_core::{ErrorMetadata, IngestError};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One table row for an ingested ad.
pub fn format_ad_row(ad: &Ad) -> String {
    format!(
        "{:<22} {:<32} {:<18} {:>5}  {}",
        ad.id,
        truncate_string(&ad.title, 32),
        truncate_string(&ad.creator, 18),
        ad.shots.len(),
        if ad.needs_review() { "review" } else { "ok" }
    )
}

/// One table row for a failed URL.
pub fn format_failure_row(url: &str, err: &IngestError) -> String {
    format!(
        "{:<54} {:<20} {}",
        truncate_string(url, 54),
        err.error_code(),
        err.stage
    )
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
