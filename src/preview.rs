use crate::links::watch_url;
use crate::model::VideoCandidate;

/// The video currently loaded in the preview overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPlayer {
    pub title: String,
    pub thumbnail: String,
    pub embed_url: String,
}

impl PreviewPlayer {
    pub fn watch_url(&self) -> String {
        watch_url(&self.embed_url)
    }
}

/// Single shared preview overlay. At most one player exists at a time.
#[derive(Debug, Default)]
pub struct PreviewModal {
    player: Option<PreviewPlayer>,
}

impl PreviewModal {
    /// Show `candidate`, replacing whatever was playing before.
    pub fn open(&mut self, candidate: &VideoCandidate) {
        log::debug!("Previewing {}", candidate.selection_url());
        self.player = Some(PreviewPlayer {
            title: candidate.title.clone(),
            thumbnail: candidate.thumbnail.clone(),
            embed_url: candidate.selection_url().to_string(),
        });
    }

    /// Hide the overlay and drop the player so nothing keeps playing.
    pub fn close(&mut self) {
        self.player = None;
    }

    pub fn is_open(&self) -> bool {
        self.player.is_some()
    }

    pub fn player(&self) -> Option<&PreviewPlayer> {
        self.player.as_ref()
    }
}
