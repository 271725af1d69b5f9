// Module for application state and reconciliation of gateway completions
use crate::api::{ApiError, UpdateRequest};
use crate::model::{AnalysisCache, VideoCandidate, Workout};
use crate::pipeline::{self, MaterialFilter, Selection, SortMode};
use crate::preview::PreviewModal;
use crate::worker::{ApiEvent, ApiRequest};
use std::collections::{HashMap, HashSet};

/// Message shown in a results panel when the request never got a response.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Error searching.";

/// Contents of the transient results panel below a workout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsPanel {
    Searching,
    Candidates(Vec<VideoCandidate>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePhase {
    Saving,
    Saved(String),
    Failed(String),
}

/// Progress of the most recent select action for one workout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatus {
    pub video_url: String,
    pub phase: UpdatePhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalyzeStatus {
    #[default]
    Idle,
    Running,
    Done(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Loading,
    Loaded(usize),
    Failed,
}

/// Everything the view is derived from.
///
/// The workout store and analysis cache are only replaced or mutated from
/// [`AppState::apply`], i.e. after a request has completed.
#[derive(Debug, Default)]
pub struct AppState {
    pub workouts: Vec<Workout>,
    pub analysis: AnalysisCache,
    pub selection: Selection,
    pub materials: Vec<String>,
    pub load_status: LoadStatus,
    pub analyze_status: AnalyzeStatus,
    pub panels: HashMap<String, ResultsPanel>,
    pub custom_urls: HashMap<String, String>,
    pub updates: HashMap<String, UpdateStatus>,
    pub collapsed: HashSet<String>,
    pub preview: PreviewModal,
}

impl AppState {
    pub fn workout(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn visible(&self) -> Vec<&Workout> {
        pipeline::visible_workouts(&self.workouts, &self.analysis, &self.selection)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        !self.collapsed.contains(id)
    }

    pub fn toggle_expanded(&mut self, id: &str) {
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.to_string());
        }
    }

    pub fn custom_url(&self, id: &str) -> &str {
        self.custom_urls.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn set_custom_url(&mut self, id: &str, text: String) {
        self.custom_urls.insert(id.to_string(), text);
    }

    /// Start the bulk analysis unless one is already running.
    pub fn begin_analyze(&mut self, api_key: Option<String>) -> Option<ApiRequest> {
        if self.analyze_status == AnalyzeStatus::Running {
            return None;
        }
        self.analyze_status = AnalyzeStatus::Running;
        Some(ApiRequest::Analyze { api_key })
    }

    pub fn begin_search(&mut self, id: &str, api_key: Option<String>) -> Option<ApiRequest> {
        let workout = self.workout(id)?;
        let request = ApiRequest::Search {
            workout_id: workout.id.clone(),
            api_key,
            query: workout.search_query(),
            exercise_name: workout.exercise_name.clone(),
        };
        self.panels.insert(id.to_string(), ResultsPanel::Searching);
        Some(request)
    }

    /// Resolve the custom URL typed for `id`. Blank input does nothing.
    pub fn begin_resolve(&mut self, id: &str, api_key: Option<String>) -> Option<ApiRequest> {
        let url = self.custom_url(id).trim().to_string();
        if url.is_empty() || self.workout(id).is_none() {
            return None;
        }
        self.panels.insert(id.to_string(), ResultsPanel::Searching);
        Some(ApiRequest::Resolve {
            workout_id: id.to_string(),
            api_key,
            url,
        })
    }

    /// Ask the backend to link `candidate` to workout `id`.
    ///
    /// The store itself is left alone until the update is confirmed.
    pub fn begin_update(&mut self, id: &str, candidate: &VideoCandidate) -> Option<ApiRequest> {
        self.workout(id)?;
        let request = UpdateRequest {
            workout_id: id.to_string(),
            video_url: candidate.selection_url().to_string(),
            thumbnail_url: candidate.thumbnail.clone(),
        };
        self.updates.insert(
            id.to_string(),
            UpdateStatus {
                video_url: request.video_url.clone(),
                phase: UpdatePhase::Saving,
            },
        );
        Some(ApiRequest::Update(request))
    }

    pub fn open_preview(&mut self, candidate: &VideoCandidate) {
        self.preview.open(candidate);
    }

    pub fn close_preview(&mut self) {
        self.preview.close();
    }

    /// Reconcile a completed request with the state.
    pub fn apply(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::WorkoutsLoaded(Ok(workouts)) => {
                log::info!("Loaded {} workouts", workouts.len());
                self.materials = pipeline::material_options(&workouts);
                let stale = matches!(
                    &self.selection.material,
                    MaterialFilter::Only(m) if !self.materials.contains(m)
                );
                if stale {
                    log::info!("Material filter no longer present, showing all materials");
                    self.selection.material = MaterialFilter::All;
                }
                self.load_status = LoadStatus::Loaded(workouts.len());
                self.workouts = workouts;
            }
            ApiEvent::WorkoutsLoaded(Err(e)) => {
                log::error!("Failed to load workouts: {e}");
                self.load_status = LoadStatus::Failed;
            }
            ApiEvent::Analyzed(Ok(cache)) => {
                log::info!("Analysis returned {} results", cache.len());
                self.analyze_status = AnalyzeStatus::Done(cache.len());
                self.analysis = cache;
                self.selection.sort = SortMode::MatchAscending;
            }
            ApiEvent::Analyzed(Err(e)) => {
                log::error!("Analysis failed: {e}");
                self.analyze_status = AnalyzeStatus::Failed(e.to_string());
            }
            ApiEvent::SearchFinished { workout_id, result } => {
                let panel = match result {
                    Ok(candidates) => ResultsPanel::Candidates(candidates),
                    Err(e) => error_panel(&e),
                };
                self.panels.insert(workout_id, panel);
            }
            ApiEvent::Resolved { workout_id, result } => {
                let panel = match result {
                    Ok(candidate) => ResultsPanel::Candidates(vec![candidate]),
                    Err(e) => error_panel(&e),
                };
                self.panels.insert(workout_id, panel);
            }
            ApiEvent::Updated { request, result } => self.finish_update(request, result),
        }
    }

    fn finish_update(&mut self, request: UpdateRequest, result: Result<String, ApiError>) {
        let phase = match result {
            Ok(message) => {
                match self.workouts.iter_mut().find(|w| w.id == request.workout_id) {
                    Some(w) => {
                        w.video_search_url = request.video_url.clone();
                        w.thumbnail = Some(request.thumbnail_url.clone());
                    }
                    None => log::warn!(
                        "Updated workout {} is no longer in the list",
                        request.workout_id
                    ),
                }
                log::info!("Workout {} updated: {message}", request.workout_id);
                UpdatePhase::Saved(message)
            }
            Err(e) => {
                log::error!("Updating workout {} failed: {e}", request.workout_id);
                UpdatePhase::Failed(e.to_string())
            }
        };
        self.updates.insert(
            request.workout_id,
            UpdateStatus {
                video_url: request.video_url,
                phase,
            },
        );
    }
}

fn error_panel(e: &ApiError) -> ResultsPanel {
    log::error!("Video lookup failed: {e}");
    if e.is_transport() {
        ResultsPanel::Error(TRANSPORT_ERROR_MESSAGE.to_string())
    } else {
        ResultsPanel::Error(e.to_string())
    }
}
