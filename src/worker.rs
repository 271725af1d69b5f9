use crate::api::{ApiClient, ApiError, UpdateRequest};
use crate::model::{AnalysisCache, VideoCandidate, Workout};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// A gateway call to run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    LoadWorkouts,
    Analyze {
        api_key: Option<String>,
    },
    Search {
        workout_id: String,
        api_key: Option<String>,
        query: String,
        exercise_name: String,
    },
    Resolve {
        workout_id: String,
        api_key: Option<String>,
        url: String,
    },
    Update(UpdateRequest),
}

/// Completion of an [`ApiRequest`], delivered back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEvent {
    WorkoutsLoaded(Result<Vec<Workout>, ApiError>),
    Analyzed(Result<AnalysisCache, ApiError>),
    SearchFinished {
        workout_id: String,
        result: Result<Vec<VideoCandidate>, ApiError>,
    },
    Resolved {
        workout_id: String,
        result: Result<VideoCandidate, ApiError>,
    },
    Updated {
        request: UpdateRequest,
        result: Result<String, ApiError>,
    },
}

/// Execute a request synchronously on the calling thread.
pub fn run(client: &ApiClient, request: ApiRequest) -> ApiEvent {
    match request {
        ApiRequest::LoadWorkouts => ApiEvent::WorkoutsLoaded(client.fetch_workouts()),
        ApiRequest::Analyze { api_key } => ApiEvent::Analyzed(client.analyze(api_key.as_deref())),
        ApiRequest::Search {
            workout_id,
            api_key,
            query,
            exercise_name,
        } => ApiEvent::SearchFinished {
            result: client.search_videos(api_key.as_deref(), &query, &exercise_name),
            workout_id,
        },
        ApiRequest::Resolve {
            workout_id,
            api_key,
            url,
        } => ApiEvent::Resolved {
            result: client.resolve_video(api_key.as_deref(), &url),
            workout_id,
        },
        ApiRequest::Update(request) => ApiEvent::Updated {
            result: client.update_workout(&request),
            request,
        },
    }
}

/// Runs every request on its own thread and funnels completions into one channel.
///
/// Requests are never cancelled or coalesced; completions arrive in whatever
/// order the backend answers.
pub struct Dispatcher {
    client: ApiClient,
    tx: Sender<ApiEvent>,
    rx: Receiver<ApiEvent>,
    repaint: Option<egui::Context>,
}

impl Dispatcher {
    pub fn new(client: ApiClient, repaint: Option<egui::Context>) -> Self {
        let (tx, rx) = channel();
        Self {
            client,
            tx,
            rx,
            repaint,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn set_client(&mut self, client: ApiClient) {
        self.client = client;
    }

    pub fn dispatch(&self, request: ApiRequest) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        thread::spawn(move || {
            let event = run(&client, request);
            if tx.send(event).is_err() {
                log::warn!("Dropping API completion: application closed");
            }
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    /// Drain every completion that has arrived so far.
    pub fn poll(&self) -> Vec<ApiEvent> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    fn wait(&self, timeout: std::time::Duration) -> Option<ApiEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}
