use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

use super::shot::Shot;

pub const PRODUCT_PLACEHOLDER: &str = "[Unknown Product]";
pub const VERTICAL_PLACEHOLDER: &str = "[Unknown Vertical]";
pub const SUMMARY_PENDING: &str = "[Analysis pending]";
/// Marks an ad whose AI analysis was unavailable and needs a curator.
pub const SUMMARY_ANALYSIS_FAILED: &str = "[AI analysis failed]";
pub const KEY_LESSON_PENDING: &str = "[Key lesson pending]";

/// Affiliate / paid / organic classification of an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum AdType {
    Affiliate,
    Paid,
    Organic,
    #[default]
    Unknown,
}

impl Display for AdType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AdType::Affiliate => write!(f, "Affiliate"),
            AdType::Paid => write!(f, "Paid"),
            AdType::Organic => write!(f, "Organic"),
            AdType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for AdType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "affiliate" => Ok(AdType::Affiliate),
            "paid" => Ok(AdType::Paid),
            "organic" => Ok(AdType::Organic),
            "unknown" => Ok(AdType::Unknown),
            _ => Err(anyhow::anyhow!("Invalid ad type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    pub text_overlay: String,
    pub spoken: String,
}

/// A named persuasion technique found in the ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tactic {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhyItWorked {
    pub summary: String,
    pub tactics: Vec<Tactic>,
    pub key_lesson: String,
}

impl WhyItWorked {
    pub fn analysis_failed(&self) -> bool {
        self.summary == SUMMARY_ANALYSIS_FAILED
    }
}

/// A fully ingested ad. `id` is the source post id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: String,
    pub title: String,
    pub video_src: String,
    pub source: String,
    pub creator: String,
    pub product: String,
    pub vertical: String,
    #[serde(rename = "type")]
    pub ad_type: AdType,
    pub hook: Hook,
    pub full_transcript: String,
    pub why_it_worked: WhyItWorked,
    pub shots: Vec<Shot>,
    pub tags: Vec<String>,
    #[schema(value_type = String, format = Date)]
    pub date_added: NaiveDate,
}

impl Ad {
    /// Ads without shots or without AI analysis need a human pass.
    pub fn needs_review(&self) -> bool {
        self.shots.is_empty() || self.why_it_worked.analysis_failed()
    }
}
