use serde::{Deserialize, Serialize};

/// One time-aligned piece of speech, as returned by the speech-to-text engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub full_transcript: String,
    /// Ordered by `start`; may be empty for silent or music-only videos
    pub segments: Vec<TranscriptSegment>,
    pub language: Option<String>,
    pub duration: Option<f64>,
}
