// Module projecting the app state into plain view data; `render` rebuilds the whole list
use crate::model::VideoCandidate;
use crate::pipeline::score_for;
use crate::state::{AppState, ResultsPanel, UpdatePhase};

/// Colour band of a match score badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLevel {
    Poor,
    Fair,
    Good,
}

impl ScoreLevel {
    pub fn for_score(score: i64) -> Self {
        if score < 40 {
            ScoreLevel::Poor
        } else if score < 80 {
            ScoreLevel::Fair
        } else {
            ScoreLevel::Good
        }
    }

    pub fn color(self) -> egui::Color32 {
        match self {
            ScoreLevel::Poor => egui::Color32::from_rgb(220, 53, 69),
            ScoreLevel::Fair => egui::Color32::from_rgb(253, 126, 20),
            ScoreLevel::Good => egui::Color32::from_rgb(40, 167, 69),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBadge {
    pub score: i64,
    pub level: ScoreLevel,
}

impl ScoreBadge {
    fn new(score: i64) -> Self {
        Self {
            score,
            level: ScoreLevel::for_score(score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Remote(String),
    Placeholder,
}

impl Thumbnail {
    fn from_url(url: Option<&str>) -> Self {
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(u) => Thumbnail::Remote(u.to_string()),
            None => Thumbnail::Placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectButton {
    pub label: &'static str,
    pub enabled: bool,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCard {
    pub candidate: VideoCandidate,
    pub thumbnail: Thumbnail,
    pub badge: Option<ScoreBadge>,
    pub select: SelectButton,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    Hidden,
    Searching,
    Error(String),
    Candidates(Vec<CandidateCard>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub instructions: String,
    pub current_video: Option<String>,
    pub analyzed_title: Option<String>,
    pub analyzed_description: Option<String>,
    pub custom_url: String,
    pub results: ResultsView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutCard {
    pub id: String,
    pub exercise_name: String,
    pub thumbnail: Thumbnail,
    pub badge: Option<ScoreBadge>,
    pub category: String,
    pub material: String,
    pub done: bool,
    pub details: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub cards: Vec<WorkoutCard>,
    pub total: usize,
}

pub fn render(state: &AppState) -> ListView {
    let cards = state
        .visible()
        .into_iter()
        .map(|w| {
            let analysis = state.analysis.get(&w.id);
            let details = state.is_expanded(&w.id).then(|| CardDetails {
                instructions: w.instructions.clone(),
                current_video: w.has_video().then(|| w.video_search_url.clone()),
                analyzed_title: analysis
                    .map(|a| a.title.clone())
                    .filter(|t| !t.is_empty()),
                analyzed_description: analysis
                    .map(|a| a.description.clone())
                    .filter(|d| !d.is_empty()),
                custom_url: state.custom_url(&w.id).to_string(),
                results: results_view(state, &w.id),
            });
            WorkoutCard {
                id: w.id.clone(),
                exercise_name: w.exercise_name.clone(),
                thumbnail: Thumbnail::from_url(w.thumbnail.as_deref()),
                badge: analysis.map(|_| ScoreBadge::new(score_for(&state.analysis, &w.id))),
                category: w.category.clone(),
                material: w.material_name.clone(),
                done: w.has_video(),
                details,
            }
        })
        .collect();

    ListView {
        cards,
        total: state.workouts.len(),
    }
}

fn results_view(state: &AppState, id: &str) -> ResultsView {
    match state.panels.get(id) {
        None => ResultsView::Hidden,
        Some(ResultsPanel::Searching) => ResultsView::Searching,
        Some(ResultsPanel::Error(msg)) => ResultsView::Error(msg.clone()),
        Some(ResultsPanel::Candidates(list)) => ResultsView::Candidates(
            list.iter()
                .map(|c| CandidateCard {
                    candidate: c.clone(),
                    thumbnail: Thumbnail::from_url(Some(&c.thumbnail)),
                    badge: c.match_score.map(ScoreBadge::new),
                    select: select_button(state, id, c),
                })
                .collect(),
        ),
    }
}

fn select_button(state: &AppState, id: &str, candidate: &VideoCandidate) -> SelectButton {
    let idle = SelectButton {
        label: "Select This Video",
        enabled: true,
        failed: false,
    };
    let Some(status) = state.updates.get(id) else {
        return idle;
    };
    if status.video_url != candidate.selection_url() {
        // Another candidate of this workout is being saved.
        return SelectButton {
            enabled: status.phase != UpdatePhase::Saving,
            ..idle
        };
    }
    match status.phase {
        UpdatePhase::Saving => SelectButton {
            label: "Saving...",
            enabled: false,
            failed: false,
        },
        UpdatePhase::Saved(_) => SelectButton {
            label: "Saved!",
            enabled: true,
            failed: false,
        },
        UpdatePhase::Failed(_) => SelectButton {
            label: "Failed - Retry",
            enabled: true,
            failed: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::model::{AnalysisResult, Workout};
    use crate::worker::{ApiEvent, ApiRequest};

    fn state_with(workouts: Vec<Workout>) -> AppState {
        let mut state = AppState::default();
        state.apply(ApiEvent::WorkoutsLoaded(Ok(workouts)));
        state
    }

    fn push_up() -> Workout {
        Workout {
            id: "1".into(),
            exercise_name: "Push Up".into(),
            category: "Chest".into(),
            material_name: "Mat".into(),
            instructions: "Lower slowly".into(),
            video_search_url: String::new(),
            thumbnail: None,
        }
    }

    fn candidate(id: &str, score: Option<i64>) -> VideoCandidate {
        VideoCandidate {
            title: id.into(),
            embed_url: format!("https://www.youtube.com/embed/{id}"),
            thumbnail: format!("https://i.ytimg.com/vi/{id}/hq.jpg"),
            match_score: score,
            ..Default::default()
        }
    }

    #[test]
    fn badge_thresholds() {
        assert_eq!(ScoreLevel::for_score(0), ScoreLevel::Poor);
        assert_eq!(ScoreLevel::for_score(39), ScoreLevel::Poor);
        assert_eq!(ScoreLevel::for_score(40), ScoreLevel::Fair);
        assert_eq!(ScoreLevel::for_score(79), ScoreLevel::Fair);
        assert_eq!(ScoreLevel::for_score(80), ScoreLevel::Good);
        assert_eq!(ScoreLevel::for_score(100), ScoreLevel::Good);
    }

    #[test]
    fn unanalyzed_card_has_placeholder_and_no_badge() {
        let view = render(&state_with(vec![push_up()]));
        assert_eq!(view.total, 1);
        let card = &view.cards[0];
        assert_eq!(card.thumbnail, Thumbnail::Placeholder);
        assert!(card.badge.is_none());
        assert!(!card.done);
        let details = card.details.as_ref().expect("expanded by default");
        assert_eq!(details.current_video, None);
        assert_eq!(details.results, ResultsView::Hidden);
        assert_eq!(details.instructions, "Lower slowly");
    }

    #[test]
    fn analyzed_card_shows_badge_and_fetched_text() {
        let mut w = push_up();
        w.video_search_url = "https://www.youtube.com/embed/old".into();
        w.thumbnail = Some("https://i.ytimg.com/vi/old/hq.jpg".into());
        let mut state = state_with(vec![w]);
        state.analysis.insert(
            "1".into(),
            AnalysisResult {
                match_score: 55,
                title: "Cooking pasta".into(),
                description: String::new(),
            },
        );

        let card = render(&state).cards.remove(0);
        assert!(card.done);
        assert_eq!(
            card.badge,
            Some(ScoreBadge {
                score: 55,
                level: ScoreLevel::Fair
            })
        );
        assert_eq!(
            card.thumbnail,
            Thumbnail::Remote("https://i.ytimg.com/vi/old/hq.jpg".into())
        );
        let details = card.details.unwrap();
        assert_eq!(details.analyzed_title.as_deref(), Some("Cooking pasta"));
        assert_eq!(details.analyzed_description, None);
    }

    #[test]
    fn collapsed_card_has_no_details() {
        let mut state = state_with(vec![push_up()]);
        state.toggle_expanded("1");
        assert!(render(&state).cards[0].details.is_none());
    }

    #[test]
    fn render_follows_filter() {
        let mut state = state_with(vec![push_up()]);
        state.selection.search_text = "squat".into();
        let view = render(&state);
        assert!(view.cards.is_empty());
        assert_eq!(view.total, 1);
    }

    #[test]
    fn select_buttons_reflect_update_progress() {
        let mut state = state_with(vec![push_up()]);
        state.apply(ApiEvent::SearchFinished {
            workout_id: "1".into(),
            result: Ok(vec![candidate("aaaaaa1", Some(90)), candidate("bbbbbb2", None)]),
        });
        let Some(ApiRequest::Update(request)) =
            state.begin_update("1", &candidate("aaaaaa1", Some(90)))
        else {
            panic!("expected update");
        };

        let cards = match render(&state).cards.remove(0).details.unwrap().results {
            ResultsView::Candidates(c) => c,
            other => panic!("unexpected results: {other:?}"),
        };
        assert_eq!(cards[0].select.label, "Saving...");
        assert!(!cards[0].select.enabled);
        assert!(!cards[1].select.enabled);
        assert_eq!(
            cards[0].badge.map(|b| b.level),
            Some(ScoreLevel::Good)
        );
        assert!(cards[1].badge.is_none());

        state.apply(ApiEvent::Updated {
            request,
            result: Err(ApiError::Status(500, "boom".into())),
        });
        let cards = match render(&state).cards.remove(0).details.unwrap().results {
            ResultsView::Candidates(c) => c,
            other => panic!("unexpected results: {other:?}"),
        };
        assert_eq!(cards[0].select.label, "Failed - Retry");
        assert!(cards[0].select.enabled && cards[0].select.failed);
        assert!(cards[1].select.enabled);
    }
}
