//! Typed schema for the creative analysis returned by the language model.
//!
//! Everything the model sends is optional. [`AdAnalysis::sanitize`] is applied
//! before the analysis is merged into an ad, so merge code only ever sees
//! trimmed, non-blank values and shot ids that exist.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use super::ad::{AdType, Tactic};

/// Output token budget for one analysis call: a base plus a share per shot,
/// capped by what the model will return in one response.
pub const MAX_OUTPUT_TOKENS_CAP: u32 = 8192;
pub const BASE_OUTPUT_TOKENS: u32 = 1024;
pub const OUTPUT_TOKENS_PER_SHOT: u32 = 256;

/// Most shots one call can carry before the cap would truncate the response.
pub const MAX_SHOTS_PER_CALL: usize =
    ((MAX_OUTPUT_TOKENS_CAP - BASE_OUTPUT_TOKENS) / OUTPUT_TOKENS_PER_SHOT) as usize;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps every shot entry that parses and drops the rest one by one.
fn lenient_shots<'de, D>(deserializer: D) -> Result<Vec<ShotAnalysis>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawShotId {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Models write shot ids as `1`, `1.0` or `"1"`; all mean shot 1.
fn lenient_shot_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match RawShotId::deserialize(deserializer)? {
        RawShotId::Int(n) => u32::try_from(n).ok(),
        RawShotId::Float(f) if f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) => {
            Some(f as u32)
        }
        RawShotId::Float(_) => None,
        RawShotId::Text(s) => s.trim().parse::<u32>().ok(),
    };
    id.ok_or_else(|| D::Error::custom("shot id is not a non-negative integer"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdAnalysis {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub vertical: Option<String>,
    #[serde(default, rename = "type")]
    pub ad_type: Option<String>,
    #[serde(default)]
    pub hook: Option<AnalysisHook>,
    #[serde(default)]
    pub why_it_worked: Option<AnalysisWhy>,
    #[serde(default, deserialize_with = "lenient_shots")]
    pub shots: Vec<ShotAnalysis>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHook {
    #[serde(default)]
    pub text_overlay: Option<String>,
    #[serde(default)]
    pub spoken: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisWhy {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tactics: Vec<AnalysisTactic>,
    #[serde(default)]
    pub key_lesson: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTactic {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotAnalysis {
    #[serde(deserialize_with = "lenient_shot_id")]
    pub id: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub text_overlay: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AdAnalysis {
    /// Drops everything the merge step must not trust: blank strings,
    /// unrecognised ad types, shots whose id is not in `shot_ids`, repeated
    /// shot ids (first wins), tactics without a name and duplicate tags.
    pub fn sanitize(self, shot_ids: &[u32]) -> AdAnalysis {
        let known: HashSet<u32> = shot_ids.iter().copied().collect();
        let mut seen_shots = HashSet::new();
        let shots = self
            .shots
            .into_iter()
            .filter(|s| known.contains(&s.id) && seen_shots.insert(s.id))
            .map(|s| ShotAnalysis {
                id: s.id,
                description: clean(s.description),
                text_overlay: clean(s.text_overlay),
                purpose: clean(s.purpose),
            })
            .collect();

        let mut seen_tags = HashSet::new();
        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen_tags.insert(t.to_lowercase()))
            .collect();

        AdAnalysis {
            title: clean(self.title),
            product: clean(self.product),
            vertical: clean(self.vertical),
            ad_type: clean(self.ad_type).filter(|t| t.parse::<AdType>().is_ok()),
            hook: self.hook.map(|h| AnalysisHook {
                text_overlay: clean(h.text_overlay),
                spoken: clean(h.spoken),
            }),
            why_it_worked: self.why_it_worked.map(|w| AnalysisWhy {
                summary: clean(w.summary),
                tactics: w
                    .tactics
                    .into_iter()
                    .filter_map(|t| {
                        clean(t.name).map(|name| AnalysisTactic {
                            name: Some(name),
                            description: clean(t.description),
                        })
                    })
                    .collect(),
                key_lesson: clean(w.key_lesson),
            }),
            shots,
            tags,
        }
    }

    /// Folds the analysis of a later shot chunk into this one. Ad-level fields
    /// already present are kept; shots are appended unless the id is known.
    pub fn absorb(&mut self, other: AdAnalysis) {
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.product.is_none() {
            self.product = other.product;
        }
        if self.vertical.is_none() {
            self.vertical = other.vertical;
        }
        if self.ad_type.is_none() {
            self.ad_type = other.ad_type;
        }
        if self.hook.is_none() {
            self.hook = other.hook;
        }
        if self.why_it_worked.is_none() {
            self.why_it_worked = other.why_it_worked;
        }
        for shot in other.shots {
            if !self.shots.iter().any(|s| s.id == shot.id) {
                self.shots.push(shot);
            }
        }
        for tag in other.tags {
            if !self.tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                self.tags.push(tag);
            }
        }
    }

    pub fn parsed_type(&self) -> AdType {
        self.ad_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    pub fn shot(&self, id: u32) -> Option<&ShotAnalysis> {
        self.shots.iter().find(|s| s.id == id)
    }

    pub fn tactics(&self) -> Vec<Tactic> {
        self.why_it_worked
            .as_ref()
            .map(|w| {
                w.tactics
                    .iter()
                    .filter_map(|t| {
                        t.name.clone().map(|name| Tactic {
                            name,
                            description: t.description.clone().unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_partial_model_output() {
        let raw = r#"{"title":"Greeting Ad","shots":[{"id":1,"description":"A","textOverlay":"","purpose":"P1"}],"tags":null}"#;
        let analysis: AdAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(analysis.title.as_deref(), Some("Greeting Ad"));
        assert!(analysis.tags.is_empty());
        assert!(analysis.why_it_worked.is_none());
    }

    #[test]
    fn test_shot_ids_are_read_leniently() {
        let raw = r#"{
            "title": "Greeting Ad",
            "shots": [
                {"id": "1", "description": "A"},
                {"id": 2.0, "description": "B"},
                {"id": 3, "description": "C"},
                {"id": "three", "description": "bad id"},
                {"id": -1, "description": "negative"},
                {"description": "no id"},
                "not an object"
            ],
            "tags": ["demo"]
        }"#;
        let analysis: AdAnalysis = serde_json::from_str(raw).unwrap();

        assert_eq!(analysis.title.as_deref(), Some("Greeting Ad"));
        assert_eq!(analysis.tags, vec!["demo".to_string()]);
        let ids: Vec<u32> = analysis.shots.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(analysis.shot(2).and_then(|s| s.description.as_deref()), Some("B"));
    }

    #[test]
    fn test_sanitize_drops_unknown_ids_and_blanks() {
        let analysis = AdAnalysis {
            title: Some("   ".to_string()),
            ad_type: Some("sponsored".to_string()),
            shots: vec![
                ShotAnalysis {
                    id: 1,
                    description: Some(" first ".to_string()),
                    text_overlay: Some("".to_string()),
                    purpose: None,
                },
                ShotAnalysis {
                    id: 1,
                    description: Some("duplicate".to_string()),
                    ..Default::default()
                },
                ShotAnalysis {
                    id: 9,
                    description: Some("ghost".to_string()),
                    ..Default::default()
                },
            ],
            tags: vec!["UGC".to_string(), "ugc".to_string(), " ".to_string(), "hook".to_string()],
            why_it_worked: Some(AnalysisWhy {
                summary: Some("ok".to_string()),
                tactics: vec![
                    AnalysisTactic {
                        name: Some("Scarcity".to_string()),
                        description: None,
                    },
                    AnalysisTactic {
                        name: Some(" ".to_string()),
                        description: Some("nameless".to_string()),
                    },
                ],
                key_lesson: None,
            }),
            ..Default::default()
        }
        .sanitize(&[1, 2]);

        assert!(analysis.title.is_none());
        assert!(analysis.ad_type.is_none());
        assert_eq!(analysis.shots.len(), 1);
        assert_eq!(analysis.shots[0].description.as_deref(), Some("first"));
        assert!(analysis.shots[0].text_overlay.is_none());
        assert_eq!(analysis.tags, vec!["UGC".to_string(), "hook".to_string()]);
        assert_eq!(
            analysis.tactics(),
            vec![Tactic {
                name: "Scarcity".to_string(),
                description: String::new()
            }]
        );
    }

    #[test]
    fn test_absorb_keeps_first_ad_level_fields() {
        let mut first = AdAnalysis {
            title: Some("First".to_string()),
            shots: vec![ShotAnalysis {
                id: 1,
                ..Default::default()
            }],
            tags: vec!["a".to_string()],
            ..Default::default()
        };
        first.absorb(AdAnalysis {
            title: Some("Second".to_string()),
            product: Some("Widget".to_string()),
            shots: vec![
                ShotAnalysis {
                    id: 1,
                    description: Some("late".to_string()),
                    ..Default::default()
                },
                ShotAnalysis {
                    id: 2,
                    ..Default::default()
                },
            ],
            tags: vec!["A".to_string(), "b".to_string()],
            ..Default::default()
        });
        assert_eq!(first.title.as_deref(), Some("First"));
        assert_eq!(first.product.as_deref(), Some("Widget"));
        assert_eq!(first.shots.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(first.shots[0].description.is_none());
        assert_eq!(first.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parsed_type_defaults_to_unknown() {
        let analysis = AdAnalysis {
            ad_type: Some("Paid".to_string()),
            ..Default::default()
        };
        assert_eq!(analysis.parsed_type(), AdType::Paid);
        assert_eq!(AdAnalysis::default().parsed_type(), AdType::Unknown);
    }
}
