pub mod ad;
pub mod analysis;
pub mod post;
pub mod shot;
pub mod transcript;

pub use ad::{
    Ad, AdType, Hook, Tactic, WhyItWorked, KEY_LESSON_PENDING, PRODUCT_PLACEHOLDER,
    SUMMARY_ANALYSIS_FAILED, SUMMARY_PENDING, VERTICAL_PLACEHOLDER,
};
pub use analysis::{
    AdAnalysis, AnalysisHook, AnalysisTactic, AnalysisWhy, ShotAnalysis, BASE_OUTPUT_TOKENS,
    MAX_OUTPUT_TOKENS_CAP, MAX_SHOTS_PER_CALL, OUTPUT_TOKENS_PER_SHOT,
};
pub use post::{PostMetadata, PostReference};
pub use shot::{
    format_timestamp, Shot, ShotType, SHOT_DESCRIPTION_PLACEHOLDER, SHOT_PURPOSE_PLACEHOLDER,
};
pub use transcript::{Transcript, TranscriptSegment};
