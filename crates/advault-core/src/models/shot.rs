use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

pub const SHOT_DESCRIPTION_PLACEHOLDER: &str = "[Describe what's shown]";
pub const SHOT_PURPOSE_PLACEHOLDER: &str = "[Why this works]";

/// Media kind of a shot. Ingested ads are cut from a single video, so every
/// shot is `video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShotType {
    #[default]
    Video,
}

impl Display for ShotType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ShotType::Video => write!(f, "video"),
        }
    }
}

impl FromStr for ShotType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ShotType::Video),
            _ => Err(anyhow::anyhow!("Invalid shot type: {}", s)),
        }
    }
}

/// One timestamped segment of an ad's video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    /// 1-based ordinal, contiguous within an ad
    pub id: u32,
    pub start_time: f64,
    pub end_time: f64,
    /// `M:SS-M:SS`
    pub timestamp: String,
    #[serde(rename = "type")]
    pub shot_type: ShotType,
    pub thumbnail: Option<String>,
    pub description: String,
    pub transcript: String,
    pub text_overlay: String,
    pub purpose: String,
}

/// Formats a `start`/`end` pair as `M:SS-M:SS`, truncating to whole seconds.
pub fn format_timestamp(start: f64, end: f64) -> String {
    format!("{}-{}", format_seconds(start), format_seconds(end))
}

fn format_seconds(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
