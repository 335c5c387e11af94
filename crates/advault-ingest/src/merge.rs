//! Assemble the final ad record from pipeline outputs and the (optional)
//! creative analysis.

use chrono::NaiveDate;

use advault_core::models::{
    Ad, AdAnalysis, Hook, Shot, WhyItWorked, KEY_LESSON_PENDING, PRODUCT_PLACEHOLDER,
    SUMMARY_ANALYSIS_FAILED, SUMMARY_PENDING, VERTICAL_PLACEHOLDER,
};

/// Everything the merge step needs besides the analysis.
#[derive(Debug, Clone)]
pub struct AdDraft {
    pub post_id: String,
    pub source_url: String,
    pub video_src: String,
    pub author_handle: String,
    pub full_transcript: String,
    pub shots: Vec<Shot>,
    pub date_added: NaiveDate,
}

pub fn fallback_title(author_handle: &str) -> String {
    format!("Ad from @{}", author_handle)
}

/// Merge the analysis into the draft.
///
/// The analysis is sanitized against the draft's shot ids first, so unknown
/// ids, blank strings and unrecognised ad types fall back to placeholders.
pub fn assemble_ad(draft: AdDraft, analysis: Option<AdAnalysis>) -> Ad {
    let shot_ids: Vec<u32> = draft.shots.iter().map(|s| s.id).collect();
    let analysis_failed = analysis.is_none();
    let analysis = analysis
        .map(|a| a.sanitize(&shot_ids))
        .unwrap_or_default();

    let shots: Vec<Shot> = draft
        .shots
        .into_iter()
        .map(|mut shot| {
            if let Some(enriched) = analysis.shot(shot.id) {
                if let Some(description) = &enriched.description {
                    shot.description = description.clone();
                }
                if let Some(text_overlay) = &enriched.text_overlay {
                    shot.text_overlay = text_overlay.clone();
                }
                if let Some(purpose) = &enriched.purpose {
                    shot.purpose = purpose.clone();
                }
            }
            shot
        })
        .collect();

    let first_spoken = shots
        .first()
        .map(|s| s.transcript.clone())
        .unwrap_or_default();
    let hook = Hook {
        text_overlay: analysis
            .hook
            .as_ref()
            .and_then(|h| h.text_overlay.clone())
            .unwrap_or_default(),
        spoken: analysis
            .hook
            .as_ref()
            .and_then(|h| h.spoken.clone())
            .unwrap_or(first_spoken),
    };

    let why = analysis.why_it_worked.as_ref();
    let summary = match why.and_then(|w| w.summary.clone()) {
        Some(summary) => summary,
        None if analysis_failed => SUMMARY_ANALYSIS_FAILED.to_string(),
        None => SUMMARY_PENDING.to_string(),
    };
    let why_it_worked = WhyItWorked {
        summary,
        tactics: analysis.tactics(),
        key_lesson: why
            .and_then(|w| w.key_lesson.clone())
            .unwrap_or_else(|| KEY_LESSON_PENDING.to_string()),
    };

    Ad {
        id: draft.post_id,
        title: analysis
            .title
            .clone()
            .unwrap_or_else(|| fallback_title(&draft.author_handle)),
        video_src: draft.video_src,
        source: draft.source_url,
        creator: format!("@{}", draft.author_handle),
        product: analysis
            .product
            .clone()
            .unwrap_or_else(|| PRODUCT_PLACEHOLDER.to_string()),
        vertical: analysis
            .vertical
            .clone()
            .unwrap_or_else(|| VERTICAL_PLACEHOLDER.to_string()),
        ad_type: analysis.parsed_type(),
        hook,
        full_transcript: draft.full_transcript,
        why_it_worked,
        shots,
        tags: analysis.tags,
        date_added: draft.date_added,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shots::build_shots;
    use advault_core::models::{
        AdType, AnalysisHook, AnalysisTactic, AnalysisWhy, ShotAnalysis, TranscriptSegment,
        SHOT_DESCRIPTION_PLACEHOLDER, SHOT_PURPOSE_PLACEHOLDER,
    };

    fn draft() -> AdDraft {
        let segments = vec![
            TranscriptSegment {
                start: 0.0,
                end: 2.5,
                text: "Hello".to_string(),
            },
            TranscriptSegment {
                start: 2.5,
                end: 5.0,
                text: "world".to_string(),
            },
        ];
        AdDraft {
            post_id: "12345".to_string(),
            source_url: "https://x.com/alice/status/12345".to_string(),
            video_src: "/storage/videos/12345.mp4".to_string(),
            author_handle: "alice".to_string(),
            full_transcript: "Hello world".to_string(),
            shots: build_shots(&segments),
            date_added: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn shot_analysis(id: u32, description: &str, purpose: &str) -> ShotAnalysis {
        ShotAnalysis {
            id,
            description: Some(description.to_string()),
            text_overlay: Some(String::new()),
            purpose: Some(purpose.to_string()),
        }
    }

    #[test]
    fn test_no_analysis_uses_placeholders() {
        let ad = assemble_ad(draft(), None);

        assert_eq!(ad.id, "12345");
        assert_eq!(ad.title, "Ad from @alice");
        assert_eq!(ad.creator, "@alice");
        assert_eq!(ad.product, PRODUCT_PLACEHOLDER);
        assert_eq!(ad.vertical, VERTICAL_PLACEHOLDER);
        assert_eq!(ad.ad_type, AdType::Unknown);
        assert_eq!(ad.hook.spoken, "Hello");
        assert_eq!(ad.hook.text_overlay, "");
        assert_eq!(ad.why_it_worked.summary, SUMMARY_ANALYSIS_FAILED);
        assert_eq!(ad.why_it_worked.key_lesson, KEY_LESSON_PENDING);
        assert!(ad.why_it_worked.tactics.is_empty());
        assert!(ad.tags.is_empty());
        assert!(ad.needs_review());
        for shot in &ad.shots {
            assert_eq!(shot.description, SHOT_DESCRIPTION_PLACEHOLDER);
            assert_eq!(shot.purpose, SHOT_PURPOSE_PLACEHOLDER);
        }
    }

    #[test]
    fn test_analysis_fields_are_merged_by_shot_id() {
        let analysis = AdAnalysis {
            title: Some("Greeting Ad".to_string()),
            product: Some("Greetings Inc".to_string()),
            ad_type: Some("paid".to_string()),
            hook: Some(AnalysisHook {
                text_overlay: Some("HEY".to_string()),
                spoken: None,
            }),
            why_it_worked: Some(AnalysisWhy {
                summary: Some("Direct and short".to_string()),
                tactics: vec![AnalysisTactic {
                    name: Some("Pattern interrupt".to_string()),
                    description: None,
                }],
                key_lesson: None,
            }),
            shots: vec![
                shot_analysis(2, "B", "P2"),
                shot_analysis(1, "A", "P1"),
                shot_analysis(9, "ghost", "nope"),
            ],
            tags: vec!["demo".to_string(), "Demo".to_string()],
            ..Default::default()
        };

        let ad = assemble_ad(draft(), Some(analysis));

        assert_eq!(ad.title, "Greeting Ad");
        assert_eq!(ad.product, "Greetings Inc");
        assert_eq!(ad.vertical, VERTICAL_PLACEHOLDER);
        assert_eq!(ad.ad_type, AdType::Paid);
        assert_eq!(ad.hook.text_overlay, "HEY");
        assert_eq!(ad.hook.spoken, "Hello");
        assert_eq!(ad.why_it_worked.summary, "Direct and short");
        assert_eq!(ad.why_it_worked.key_lesson, KEY_LESSON_PENDING);
        assert_eq!(ad.why_it_worked.tactics.len(), 1);
        assert_eq!(ad.why_it_worked.tactics[0].description, "");
        assert_eq!(ad.shots.len(), 2);
        assert_eq!(ad.shots[0].description, "A");
        assert_eq!(ad.shots[1].purpose, "P2");
        assert_eq!(ad.tags, vec!["demo".to_string()]);
        assert!(!ad.needs_review());
    }

    #[test]
    fn test_analysis_without_summary_is_pending() {
        let analysis = AdAnalysis {
            title: Some("   ".to_string()),
            ad_type: Some("sponsored".to_string()),
            ..Default::default()
        };
        let ad = assemble_ad(draft(), Some(analysis));

        assert_eq!(ad.title, "Ad from @alice");
        assert_eq!(ad.ad_type, AdType::Unknown);
        assert_eq!(ad.why_it_worked.summary, SUMMARY_PENDING);
    }

    #[test]
    fn test_zero_shot_ad_is_valid() {
        let mut d = draft();
        d.shots.clear();
        d.full_transcript.clear();
        let ad = assemble_ad(d, None);

        assert!(ad.shots.is_empty());
        assert_eq!(ad.hook.spoken, "");
        assert!(ad.needs_review());
    }
}
