//! Creative analyzer backed by the Gemini generateContent API.
//!
//! Every failure path (transport, non-2xx, empty candidates, unparsable JSON)
//! is logged and turned into `None`; analysis never aborts an ingestion.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use advault_core::models::{
    AdAnalysis, Shot, BASE_OUTPUT_TOKENS, MAX_OUTPUT_TOKENS_CAP, OUTPUT_TOKENS_PER_SHOT,
};

use crate::traits::{AnalysisRequest, AnalysisScope, CreativeAnalyzer};

pub const TEMPERATURE: f32 = 0.4;
pub const POST_TEXT_LIMIT: usize = 2000;

/// Output budget for one call, growing with the number of shots requested.
pub fn max_output_tokens(shot_count: usize) -> u32 {
    let per_shot = u32::try_from(shot_count)
        .unwrap_or(u32::MAX)
        .saturating_mul(OUTPUT_TOKENS_PER_SHOT);
    BASE_OUTPUT_TOKENS
        .saturating_add(per_shot)
        .min(MAX_OUTPUT_TOKENS_CAP)
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = if let Some(rest) = text.split("```json").nth(1) {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some(rest) = text.split("```").nth(1) {
        rest
    } else {
        text
    };
    inner.trim()
}

/// Parse model output into an analysis, tolerating fences and chatter
/// around the JSON object.
pub fn parse_analysis(text: &str) -> Option<AdAnalysis> {
    let cleaned = strip_code_fences(text);
    if let Ok(analysis) = serde_json::from_str::<AdAnalysis>(cleaned) {
        return Some(analysis);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<AdAnalysis>(&cleaned[start..=end]).ok()
}

#[derive(Serialize)]
struct PromptShot<'a> {
    id: u32,
    timestamp: &'a str,
    transcript: &'a str,
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn shots_json(shots: &[Shot]) -> String {
    let reduced: Vec<PromptShot<'_>> = shots
        .iter()
        .map(|s| PromptShot {
            id: s.id,
            timestamp: &s.timestamp,
            transcript: &s.transcript,
        })
        .collect();
    serde_json::to_string_pretty(&reduced).unwrap_or_else(|_| "[]".to_string())
}

const FULL_SCHEMA: &str = r#"{
  "title": "Short descriptive title for the ad",
  "product": "Product or brand being advertised",
  "vertical": "Industry vertical (e.g. Health, Finance, Gaming)",
  "type": "Affiliate | Paid | Organic",
  "hook": {
    "textOverlay": "On-screen text in the first seconds, or empty string",
    "spoken": "What is said in the first seconds"
  },
  "whyItWorked": {
    "summary": "2-3 sentence explanation of why this ad is effective",
    "tactics": [
      {"name": "Tactic name", "description": "How the ad uses it"}
    ],
    "keyLesson": "The single most transferable lesson"
  },
  "shots": [
    {"id": 1, "description": "What is shown on screen", "textOverlay": "On-screen text or empty string", "purpose": "Why this moment works"}
  ],
  "tags": ["5-8 short lowercase tags"]
}"#;

const SHOTS_ONLY_SCHEMA: &str = r#"{
  "shots": [
    {"id": 1, "description": "What is shown on screen", "textOverlay": "On-screen text or empty string", "purpose": "Why this moment works"}
  ]
}"#;

/// Build the analysis prompt for one request.
pub fn build_prompt(request: &AnalysisRequest<'_>) -> String {
    let post_text = if request.post_text.trim().is_empty() {
        "N/A"
    } else {
        truncate_chars(request.post_text, POST_TEXT_LIMIT)
    };

    let (task, schema) = match request.scope {
        AnalysisScope::Full => (
            "Analyze this short-form video ad and explain why it works.",
            FULL_SCHEMA,
        ),
        AnalysisScope::ShotsOnly => (
            "Describe the following shots of a short-form video ad. The ad-level analysis already exists; only the listed shots are needed.",
            SHOTS_ONLY_SCHEMA,
        ),
    };

    format!(
        "You are an expert performance marketer who studies viral video ads.\n\n\
         {task}\n\n\
         POST TEXT:\n{post_text}\n\n\
         FULL TRANSCRIPT:\n{transcript}\n\n\
         SHOTS (one per transcript segment):\n{shots}\n\n\
         Return one entry in \"shots\" for every shot id listed above, using the same ids.\n\
         Return JSON with exactly this structure:\n{schema}\n\n\
         Respond with ONLY the JSON, no markdown and no commentary.",
        task = task,
        post_text = post_text,
        transcript = request.full_transcript,
        shots = shots_json(request.shots),
        schema = schema,
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

pub struct GeminiAnalyzer {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Debug for GeminiAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiAnalyzer")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiAnalyzer {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Gemini API")?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn generate(&self, prompt: String, max_tokens: u32) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": max_tokens
            }
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Gemini API request failed: {} - {}",
                status,
                error_text
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        parsed
            .first_text()
            .ok_or_else(|| anyhow::anyhow!("Gemini API returned no candidate text"))
    }
}

#[async_trait]
impl CreativeAnalyzer for GeminiAnalyzer {
    #[tracing::instrument(skip(self, request), fields(shots = request.shots.len(), scope = ?request.scope))]
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Option<AdAnalysis> {
        let prompt = build_prompt(&request);
        let max_tokens = max_output_tokens(request.shots.len());

        let text = match self.generate(prompt, max_tokens).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Creative analysis unavailable");
                return None;
            }
        };

        let analysis = parse_analysis(&text);
        if analysis.is_none() {
            tracing::warn!(
                response_len = text.len(),
                "Creative analysis response was not valid JSON"
            );
        }
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advault_core::models::{ShotType, MAX_SHOTS_PER_CALL};
    use mockito::Matcher;

    fn shot(id: u32, transcript: &str) -> Shot {
        Shot {
            id,
            start_time: 0.0,
            end_time: 1.0,
            timestamp: "0:00-0:01".to_string(),
            shot_type: ShotType::Video,
            thumbnail: None,
            description: "[Describe what's shown]".to_string(),
            transcript: transcript.to_string(),
            text_overlay: String::new(),
            purpose: "[Why this works]".to_string(),
        }
    }

    #[test]
    fn test_max_output_tokens_scales_and_caps() {
        assert_eq!(max_output_tokens(0), 1024);
        assert_eq!(max_output_tokens(4), 2048);
        assert_eq!(max_output_tokens(28), 8192);
        assert_eq!(max_output_tokens(500), 8192);
        // The largest chunk still fits without hitting the cap early
        assert_eq!(max_output_tokens(MAX_SHOTS_PER_CALL), 8192);
        assert!(max_output_tokens(MAX_SHOTS_PER_CALL - 1) < 8192);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_analysis_with_chatter() {
        let text = "Sure! Here it is: {\"title\": \"T\", \"tags\": [\"a\"]} Hope this helps.";
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.title.as_deref(), Some("T"));
        assert_eq!(analysis.tags, vec!["a".to_string()]);

        assert!(parse_analysis("not json at all").is_none());
        assert!(parse_analysis("} backwards {").is_none());
    }

    #[test]
    fn test_parse_analysis_keeps_fields_when_shot_ids_are_strings() {
        let text = r#"{"title":"Greeting Ad","whyItWorked":{"summary":"Direct"},"shots":[{"id":"1","description":"A","textOverlay":"","purpose":"P1"},{"id":"x","description":"?"}],"tags":["demo"]}"#;
        let analysis = parse_analysis(text).unwrap();

        assert_eq!(analysis.title.as_deref(), Some("Greeting Ad"));
        assert_eq!(
            analysis.why_it_worked.and_then(|w| w.summary).as_deref(),
            Some("Direct")
        );
        assert_eq!(analysis.tags, vec!["demo".to_string()]);
        assert_eq!(analysis.shots.len(), 1);
        assert_eq!(analysis.shots[0].id, 1);
        assert_eq!(analysis.shots[0].purpose.as_deref(), Some("P1"));
    }

    #[test]
    fn test_prompt_withholds_visual_fields_and_truncates_text() {
        let shots = vec![shot(1, "Hello"), shot(2, "world")];
        let long_text = "x".repeat(POST_TEXT_LIMIT + 500);
        let request = AnalysisRequest {
            full_transcript: "Hello world",
            post_text: &long_text,
            shots: &shots,
            scope: AnalysisScope::Full,
        };
        let prompt = build_prompt(&request);

        assert!(prompt.contains(&"x".repeat(POST_TEXT_LIMIT)));
        assert!(!prompt.contains(&"x".repeat(POST_TEXT_LIMIT + 1)));
        assert!(prompt.contains("\"transcript\": \"world\""));
        assert!(!prompt.contains("[Describe what's shown]"));
        assert!(prompt.contains("whyItWorked"));
        assert!(prompt.ends_with("Respond with ONLY the JSON, no markdown and no commentary."));

        let empty = AnalysisRequest {
            post_text: "  ",
            scope: AnalysisScope::ShotsOnly,
            ..request
        };
        let prompt = build_prompt(&empty);
        assert!(prompt.contains("POST TEXT:\nN/A"));
        assert!(!prompt.contains("whyItWorked"));
    }

    #[tokio::test]
    async fn test_analyze_parses_fenced_candidate() {
        let mut server = mockito::Server::new_async().await;
        let model_text = "```json\n{\"title\": \"Greeting Ad\", \"shots\": [{\"id\": 1, \"description\": \"A\"}]}\n```";
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": {"maxOutputTokens": 1280}
            })))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": model_text}]}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let analyzer =
            GeminiAnalyzer::new("g-key", "gemini-test", server.url(), Duration::from_secs(5))
                .unwrap();
        let shots = vec![shot(1, "Hello")];
        let analysis = analyzer
            .analyze(AnalysisRequest {
                full_transcript: "Hello",
                post_text: "",
                shots: &shots,
                scope: AnalysisScope::Full,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(analysis.title.as_deref(), Some("Greeting Ad"));
        assert_eq!(analysis.shots[0].description.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_analyze_failure_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let analyzer =
            GeminiAnalyzer::new("g-key", "gemini-test", server.url(), Duration::from_secs(5))
                .unwrap();
        let result = analyzer
            .analyze(AnalysisRequest {
                full_transcript: "",
                post_text: "",
                shots: &[],
                scope: AnalysisScope::Full,
            })
            .await;
        assert!(result.is_none());
    }
}
