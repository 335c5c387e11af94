use serde::{Deserialize, Serialize};

/// Identifies one post on the source platform, derived from its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostReference {
    /// Platform-assigned numeric id, all digits
    pub post_id: String,
    pub author_handle: String,
}

/// What the metadata API tells us about a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    /// Raw post body, may be empty
    pub text: String,
    /// Best available direct link to the video
    pub media_url: String,
    pub author_handle: String,
    pub author_display_name: String,
}
