use advault_core::models::{
    format_timestamp, Shot, ShotType, TranscriptSegment, SHOT_DESCRIPTION_PLACEHOLDER,
    SHOT_PURPOSE_PLACEHOLDER,
};

/// Build one placeholder shot per transcript segment, ids starting at 1.
///
/// Visual and marketing fields are left as placeholders for the analyzer to
/// fill in; `thumbnail` is always `None` because no frames are extracted.
pub fn build_shots(segments: &[TranscriptSegment]) -> Vec<Shot> {
    segments
        .iter()
        .zip(1u32..)
        .map(|(segment, id)| Shot {
            id,
            start_time: segment.start,
            end_time: segment.end,
            timestamp: format_timestamp(segment.start, segment.end),
            shot_type: ShotType::Video,
            thumbnail: None,
            description: SHOT_DESCRIPTION_PLACEHOLDER.to_string(),
            transcript: segment.text.clone(),
            text_overlay: String::new(),
            purpose: SHOT_PURPOSE_PLACEHOLDER.to_string(),
        })
        .collect()
}
