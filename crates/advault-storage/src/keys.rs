//! Shared key helpers for storage backends.
//!
//! Videos live at `videos/{post_id}.mp4` and are served by the API under
//! `/storage/{key}`.

use crate::{StorageError, StorageResult};

/// Prefix under which the HTTP layer serves blobs
pub const PUBLIC_PREFIX: &str = "/storage/";

/// Suffix of the local backend's content-type sidecar files
pub const META_SUFFIX: &str = ".meta.json";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub fn video_key(post_id: &str) -> String {
    format!("videos/{}.mp4", post_id)
}

/// Public path for a key, as stored in `Ad::video_src`.
pub fn public_path(key: &str) -> String {
    format!("{}{}", PUBLIC_PREFIX, key)
}

/// Inverse of [`public_path`]. Returns `None` for paths outside the prefix.
pub fn key_from_public_path(path: &str) -> Option<&str> {
    path.strip_prefix(PUBLIC_PREFIX).filter(|k| !k.is_empty())
}

/// Rejects keys that could escape the storage root or collide with sidecars.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key.ends_with(META_SUFFIX) {
        return Err(StorageError::InvalidKey(
            "Storage key uses a reserved suffix".to_string(),
        ));
    }
    Ok(())
}

/// Guess a content type from the key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
