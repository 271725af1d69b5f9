use crate::model::{AnalysisCache, DEFAULT_MATCH_SCORE, Workout};
use feruca::Collator;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Available orderings for the workout list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortMode {
    #[default]
    ByName,
    /// Worst matches first.
    MatchAscending,
    MatchDescending,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [
        SortMode::ByName,
        SortMode::MatchAscending,
        SortMode::MatchDescending,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByName => "Name (A-Z)",
            SortMode::MatchAscending => "Match score (worst first)",
            SortMode::MatchDescending => "Match score (best first)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MaterialFilter {
    #[default]
    All,
    Only(String),
}

impl MaterialFilter {
    fn accepts(&self, material: &str) -> bool {
        match self {
            MaterialFilter::All => true,
            MaterialFilter::Only(m) => m == material,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MaterialFilter::All => "All materials",
            MaterialFilter::Only(m) => m,
        }
    }
}

/// Current search text, material filter and sort mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub search_text: String,
    pub material: MaterialFilter,
    pub sort: SortMode,
}

/// Match score used for ordering; unanalyzed workouts count as a perfect match.
pub fn score_for(analysis: &AnalysisCache, id: &str) -> i64 {
    analysis
        .get(id)
        .map(|r| r.match_score)
        .unwrap_or(DEFAULT_MATCH_SCORE)
}

/// Unicode collation order (CLDR root) with the raw strings as tie-break.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collate_names(&mut Collator::default(), a, b)
}

fn collate_names(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    collator.collate(a, b).then_with(|| a.cmp(b))
}

pub fn matches_selection(workout: &Workout, selection: &Selection) -> bool {
    let needle = selection.search_text.to_lowercase();
    workout.exercise_name.to_lowercase().contains(&needle)
        && selection.material.accepts(&workout.material_name)
}

/// Filter the store by the selection and order the survivors by the active sort mode.
///
/// The result borrows from `workouts` and is rebuilt from scratch on every call.
/// Sorting is stable so equal keys keep their store order.
pub fn visible_workouts<'a>(
    workouts: &'a [Workout],
    analysis: &AnalysisCache,
    selection: &Selection,
) -> Vec<&'a Workout> {
    let mut out: Vec<&Workout> = workouts
        .iter()
        .filter(|w| matches_selection(w, selection))
        .collect();

    match selection.sort {
        SortMode::ByName => {
            let mut collator = Collator::default();
            out.sort_by(|a, b| collate_names(&mut collator, &a.exercise_name, &b.exercise_name));
        }
        SortMode::MatchAscending => {
            out.sort_by_key(|w| score_for(analysis, &w.id));
        }
        SortMode::MatchDescending => {
            out.sort_by(|a, b| score_for(analysis, &b.id).cmp(&score_for(analysis, &a.id)));
        }
    }
    out
}

/// Distinct non-blank material names observed in the store, sorted.
pub fn material_options(workouts: &[Workout]) -> Vec<String> {
    workouts
        .iter()
        .filter(|w| !w.material_name.trim().is_empty())
        .map(|w| w.material_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
