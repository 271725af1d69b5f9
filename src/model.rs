use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A catalogued exercise record as served by `/api/workouts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Workout {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub exercise_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub material_name: String,
    #[serde(default)]
    pub instructions: String,
    /// Currently linked video. Empty when nothing is linked yet.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub video_search_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Workout {
    pub fn has_video(&self) -> bool {
        !self.video_search_url.trim().is_empty()
    }

    /// Search query sent when looking for alternatives: material first.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.material_name, self.exercise_name)
            .trim()
            .to_string()
    }
}

/// Result of the server side match analysis for one workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default = "default_score")]
    pub match_score: i64,
    #[serde(default, alias = "video_title")]
    pub title: String,
    #[serde(default, alias = "video_description")]
    pub description: String,
}

/// Score assumed for workouts that have not been analyzed.
pub const DEFAULT_MATCH_SCORE: i64 = 100;

fn default_score() -> i64 {
    DEFAULT_MATCH_SCORE
}

pub type AnalysisCache = HashMap<String, AnalysisResult>;

/// A video returned by a search or resolve call that has not been selected yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VideoCandidate {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "embedUrl", default)]
    pub embed_url: String,
    #[serde(default)]
    pub match_score: Option<i64>,
}

impl VideoCandidate {
    /// Reference written back to the workout when this candidate is chosen.
    pub fn selection_url(&self) -> &str {
        if self.embed_url.is_empty() {
            &self.url
        } else {
            &self.embed_url
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid workout id: {other}"))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workout_accepts_numeric_id_and_null_fields() {
        let json = r#"{"id": 7, "exercise_name": "Push Up", "material_name": "Mat",
            "video_search_url": null, "thumbnail": null}"#;
        let w: Workout = serde_json::from_str(json).unwrap();
        assert_eq!(w.id, "7");
        assert_eq!(w.video_search_url, "");
        assert!(!w.has_video());
        assert!(w.thumbnail.is_none());
        assert!(w.category.is_empty());
    }

    #[test]
    fn search_query_puts_material_first() {
        let w = Workout {
            id: "1".into(),
            exercise_name: "Push Up".into(),
            material_name: "Mat".into(),
            ..Default::default()
        };
        assert_eq!(w.search_query(), "Mat Push Up");

        let bare = Workout {
            exercise_name: "Plank".into(),
            ..Default::default()
        };
        assert_eq!(bare.search_query(), "Plank");
    }

    #[test]
    fn analysis_result_aliases_and_default_score() {
        let r: AnalysisResult =
            serde_json::from_str(r#"{"video_title": "Squat demo", "video_description": "d"}"#)
                .unwrap();
        assert_eq!(r.match_score, DEFAULT_MATCH_SCORE);
        assert_eq!(r.title, "Squat demo");
        assert_eq!(r.description, "d");
    }

    #[test]
    fn candidate_wire_names() {
        let c: VideoCandidate = serde_json::from_str(
            r#"{"videoId": "abc", "title": "T", "thumbnail": "http://t/1.jpg",
                "url": "https://www.youtube.com/watch?v=abc",
                "embedUrl": "https://www.youtube.com/embed/abc", "match_score": 88}"#,
        )
        .unwrap();
        assert_eq!(c.video_id.as_deref(), Some("abc"));
        assert_eq!(c.selection_url(), "https://www.youtube.com/embed/abc");
        assert_eq!(c.match_score, Some(88));
        assert!(c.description.is_empty());
    }
}
