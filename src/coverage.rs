// Summary of how well the catalogue is covered by matching videos
use crate::model::{AnalysisCache, Workout};
use crate::view::ScoreLevel;
use serde::{Deserialize, Serialize};

/// Number of histogram buckets, each 20 points wide.
pub const BUCKETS: usize = 5;

/// Summary statistics about the workout store and its analysis.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub total_workouts: usize,
    pub linked: usize,
    pub unlinked: usize,
    pub analyzed: usize,
    pub poor_matches: usize,
    pub fair_matches: usize,
    pub good_matches: usize,
    pub avg_score: Option<f32>,
    pub worst_match: Option<String>,
}

/// Compute coverage statistics for `workouts`.
///
/// Only analysis entries belonging to a workout in the store are counted, so
/// stale ids returned by the backend do not skew the averages.
pub fn compute_coverage(workouts: &[Workout], analysis: &AnalysisCache) -> CoverageStats {
    if workouts.is_empty() {
        return CoverageStats::default();
    }

    let linked = workouts.iter().filter(|w| w.has_video()).count();
    let mut stats = CoverageStats {
        total_workouts: workouts.len(),
        linked,
        unlinked: workouts.len() - linked,
        ..Default::default()
    };

    let mut sum = 0i64;
    let mut worst: Option<(i64, &str)> = None;
    for w in workouts {
        let Some(result) = analysis.get(&w.id) else {
            continue;
        };
        let score = result.match_score;
        stats.analyzed += 1;
        sum += score;
        match ScoreLevel::for_score(score) {
            ScoreLevel::Poor => stats.poor_matches += 1,
            ScoreLevel::Fair => stats.fair_matches += 1,
            ScoreLevel::Good => stats.good_matches += 1,
        }
        if worst.map_or(true, |(s, _)| score < s) {
            worst = Some((score, w.exercise_name.as_str()));
        }
    }

    if stats.analyzed > 0 {
        stats.avg_score = Some(sum as f32 / stats.analyzed as f32);
    }
    stats.worst_match = worst.map(|(_, name)| name.to_string());
    stats
}

/// Count analyzed workouts per 20 point score bucket (0-19, ..., 80-100).
pub fn score_histogram(workouts: &[Workout], analysis: &AnalysisCache) -> [usize; BUCKETS] {
    let mut buckets = [0usize; BUCKETS];
    for w in workouts {
        if let Some(r) = analysis.get(&w.id) {
            let idx = (r.match_score.clamp(0, 100) / 20).min(BUCKETS as i64 - 1) as usize;
            buckets[idx] += 1;
        }
    }
    buckets
}

pub fn bucket_label(idx: usize) -> String {
    let start = idx * 20;
    let end = if idx + 1 == BUCKETS { 100 } else { start + 19 };
    format!("{start}-{end}")
}

/// Format a user facing message after the workout list has been loaded.
pub fn format_load_message(workouts: usize, server: &str) -> String {
    format!("Loaded {} workouts from {}", workouts, server)
}
