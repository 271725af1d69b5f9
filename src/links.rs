use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/(?:embed/|shorts/|watch\?(?:.*&)?v=)|youtu\.be/)([A-Za-z0-9_-]{6,})")
        .expect("valid video id regex")
});

/// Extract the YouTube video id from a watch, embed, shorts or short link.
pub fn video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// URL to open in a browser for a stored or candidate video reference.
///
/// Embed references are turned into watch pages; anything unrecognised is
/// returned untouched.
pub fn watch_url(reference: &str) -> String {
    match video_id(reference) {
        Some(id) => format!("https://www.youtube.com/watch?v={id}"),
        None => reference.to_string(),
    }
}
