use crate::model::{AnalysisCache, VideoCandidate, Workout};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const API_KEY_HEADER: &str = "X-Youtube-Api-Key";

/// Determine the YouTube API key attached to analyze/search/resolve calls.
///
/// The `YOUTUBE_API_KEY` environment variable takes precedence over the key
/// stored in the settings file. Blank keys are treated as absent.
pub fn resolve_api_key(settings_key: Option<&str>) -> Option<String> {
    let non_blank = |k: &str| Some(k.trim().to_string()).filter(|k| !k.is_empty());
    std::env::var("YOUTUBE_API_KEY")
        .ok()
        .and_then(|k| non_blank(&k))
        .or_else(|| settings_key.and_then(non_blank))
}

/// Determine the backend base URL, preferring `CURATOR_SERVER_URL`.
pub fn resolve_server_url(settings_url: Option<&str>) -> String {
    std::env::var("CURATOR_SERVER_URL")
        .ok()
        .or_else(|| settings_url.map(|s| s.to_string()))
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was obtained at all.
    Transport(String),
    /// The backend answered with an `{"error": ...}` body.
    Remote(String),
    /// Non-success status without an error field.
    Status(u16, String),
    /// The body was not the JSON we expected.
    Decode(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "Request failed: {msg}"),
            ApiError::Remote(msg) => write!(f, "{msg}"),
            ApiError::Status(code, body) => write!(f, "HTTP {code}: {body}"),
            ApiError::Decode(msg) => write!(f, "Unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    pub workout_id: String,
    pub video_url: String,
    pub thumbnail_url: String,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    exercise_name: &'a str,
}

#[derive(Serialize)]
struct ResolveBody<'a> {
    url: &'a str,
}

/// Thin client for the curation backend. Every call is a single round trip.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn fetch_workouts(&self) -> Result<Vec<Workout>, ApiError> {
        log::info!("Fetching workouts from {}", self.base_url);
        let response = self
            .agent
            .get(&self.url("/api/workouts"))
            .set("Accept", "application/json")
            .call();
        decode(read_json(response)?)
    }

    pub fn analyze(&self, api_key: Option<&str>) -> Result<AnalysisCache, ApiError> {
        log::info!("Requesting match analysis");
        let req = with_key(
            self.agent
                .get(&self.url("/api/analyze"))
                .set("Accept", "application/json"),
            api_key,
        );
        decode(read_json(req.call())?)
    }

    pub fn search_videos(
        &self,
        api_key: Option<&str>,
        query: &str,
        exercise_name: &str,
    ) -> Result<Vec<VideoCandidate>, ApiError> {
        log::info!("Searching videos for '{query}'");
        let req = with_key(self.agent.post(&self.url("/api/search_videos")), api_key);
        let body = SearchBody {
            query,
            exercise_name,
        };
        decode(read_json(req.send_json(body))?)
    }

    pub fn resolve_video(
        &self,
        api_key: Option<&str>,
        url: &str,
    ) -> Result<VideoCandidate, ApiError> {
        log::info!("Resolving custom video URL {url}");
        let req = with_key(self.agent.post(&self.url("/api/resolve_video")), api_key);
        decode(read_json(req.send_json(ResolveBody { url }))?)
    }

    /// Write a new video reference for one workout and return the server message.
    pub fn update_workout(&self, request: &UpdateRequest) -> Result<String, ApiError> {
        log::info!(
            "Updating workout {} to {}",
            request.workout_id,
            request.video_url
        );
        let response = self
            .agent
            .post(&self.url("/api/update_workout"))
            .send_json(request);
        let json = read_json(response)?;
        Ok(json
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Workout updated")
            .to_string())
    }
}

fn with_key(req: ureq::Request, api_key: Option<&str>) -> ureq::Request {
    match api_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => req.set(API_KEY_HEADER, key),
        None => req,
    }
}

/// Read a response body as JSON, mapping `{"error": ...}` bodies to
/// [`ApiError::Remote`] whatever the status code.
fn read_json(response: Result<ureq::Response, ureq::Error>) -> Result<Value, ApiError> {
    let (status, body) = match response {
        Ok(r) => {
            let status = r.status();
            let body = r
                .into_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            (status, body)
        }
        Err(ureq::Error::Status(code, r)) => (code, r.into_string().unwrap_or_default()),
        Err(ureq::Error::Transport(t)) => return Err(ApiError::Transport(t.to_string())),
    };

    let parsed = serde_json::from_str::<Value>(&body);
    if let Ok(json) = &parsed {
        if let Some(msg) = json.get("error").and_then(|e| e.as_str()) {
            return Err(ApiError::Remote(msg.to_string()));
        }
    }
    if !(200..300).contains(&status) {
        return Err(ApiError::Status(status, body));
    }
    parsed.map_err(|e| ApiError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(json: Value) -> Result<T, ApiError> {
    serde_json::from_value(json).map_err(|e| ApiError::Decode(e.to_string()))
}
