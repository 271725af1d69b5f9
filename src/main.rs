//! Workout video curation tool and its persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use log::info;

mod api;
use api::ApiClient;
mod coverage;
use coverage::{compute_coverage, format_load_message, score_histogram};
mod export;
use export::{export_rows, save_rows_csv, save_rows_json};
mod links;
mod model;
mod pipeline;
mod preview;
mod report;
mod state;
use state::{AppState, LoadStatus};
mod thumbnail;
mod ui;
use ui::UiAction;
mod view;
mod worker;
use worker::{ApiEvent, ApiRequest, Dispatcher};

fn default_server_url() -> String {
    api::DEFAULT_SERVER_URL.to_string()
}

/// Persistent configuration.
///
/// Only the remote-search API key and the backend location survive a restart;
/// search text, filters and sort order always start fresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    /// Sent as `X-Youtube-Api-Key` when non-empty. Saved on every edit.
    #[serde(default)]
    api_key: String,
    #[serde(default = "default_server_url")]
    server_url: String,
}

impl Settings {
    const FILE: &'static str = "workout_video_curator_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load settings from the JSON configuration file, falling back to defaults.
    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(cfg) = serde_json::from_str(&data) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        log::error!("Failed to save settings to {}: {e}", path.display());
                    }
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            server_url: default_server_url(),
        }
    }
}

struct CuratorApp {
    state: AppState,
    settings: Settings,
    dispatcher: Dispatcher,
    placeholder: Option<egui::TextureHandle>,
    toast_start: Option<Instant>,
    status_message: Option<String>,
    status_start: Option<Instant>,
    show_settings: bool,
    show_summary: bool,
    server_url_edit: String,
    settings_dirty: bool,
}

impl CuratorApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self::with_settings(Settings::load(), Some(cc.egui_ctx.clone()))
    }

    fn with_settings(settings: Settings, repaint: Option<egui::Context>) -> Self {
        let server = api::resolve_server_url(Some(&settings.server_url));
        let dispatcher = Dispatcher::new(ApiClient::new(&server), repaint);
        let app = Self {
            state: AppState::default(),
            server_url_edit: settings.server_url.clone(),
            settings,
            dispatcher,
            placeholder: None,
            toast_start: None,
            status_message: None,
            status_start: None,
            show_settings: false,
            show_summary: false,
            settings_dirty: false,
        };
        app.dispatcher.dispatch(ApiRequest::LoadWorkouts);
        app
    }

    fn api_key(&self) -> Option<String> {
        api::resolve_api_key(Some(&self.settings.api_key))
    }

    fn reload(&mut self) {
        self.state.load_status = LoadStatus::Loading;
        self.dispatcher.dispatch(ApiRequest::LoadWorkouts);
    }

    fn apply_server_url(&mut self) {
        self.settings.server_url = self.server_url_edit.trim().to_string();
        self.settings_dirty = true;
        let server = api::resolve_server_url(Some(&self.settings.server_url));
        info!("Using backend at {server}");
        self.dispatcher.set_client(ApiClient::new(&server));
        self.reload();
    }

    fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
        self.status_start = Some(Instant::now());
    }

    fn placeholder_texture(&mut self, ctx: &egui::Context) -> egui::TextureHandle {
        self.placeholder
            .get_or_insert_with(|| {
                ctx.load_texture(
                    "thumbnail_placeholder",
                    thumbnail::placeholder_color_image(),
                    egui::TextureOptions::LINEAR,
                )
            })
            .clone()
    }

    fn handle_event(&mut self, event: ApiEvent) {
        let loaded = matches!(event, ApiEvent::WorkoutsLoaded(Ok(_)));
        self.state.apply(event);
        if loaded {
            self.toast_start = Some(Instant::now());
        }
    }

    fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::ToggleExpanded(id) => self.state.toggle_expanded(&id),
            UiAction::SearchAlternatives(id) => {
                let key = self.api_key();
                if let Some(req) = self.state.begin_search(&id, key) {
                    self.dispatcher.dispatch(req);
                }
            }
            UiAction::CustomUrlChanged(id, text) => self.state.set_custom_url(&id, text),
            UiAction::CheckCustomUrl(id) => {
                let key = self.api_key();
                if let Some(req) = self.state.begin_resolve(&id, key) {
                    self.dispatcher.dispatch(req);
                }
            }
            UiAction::Select {
                workout_id,
                candidate,
            } => {
                if let Some(req) = self.state.begin_update(&workout_id, &candidate) {
                    self.dispatcher.dispatch(req);
                }
            }
            UiAction::Preview(candidate) => self.state.open_preview(&candidate),
            UiAction::ClosePreview => self.state.close_preview(),
            UiAction::OpenLink(url) => {
                if let Err(e) = open::that(&url) {
                    log::error!("Failed to open {url}: {e}");
                }
            }
            UiAction::Analyze => {
                let key = self.api_key();
                if let Some(req) = self.state.begin_analyze(key) {
                    self.dispatcher.dispatch(req);
                }
            }
            UiAction::ApiKeyChanged(key) => {
                self.settings.api_key = key;
                self.settings_dirty = true;
            }
        }
    }

    fn export_csv(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).save_file() {
            let rows = export_rows(&self.state.visible(), &self.state.analysis);
            match save_rows_csv(&path, &rows) {
                Ok(()) => self.set_status(format!("Exported {} workouts", rows.len())),
                Err(e) => {
                    log::error!("Failed to export workouts: {e}");
                    self.set_status("Export failed".into());
                }
            }
        }
    }

    fn export_json(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("JSON", &["json"]).save_file() {
            let rows = export_rows(&self.state.visible(), &self.state.analysis);
            match save_rows_json(&path, &rows) {
                Ok(()) => self.set_status(format!("Exported {} workouts", rows.len())),
                Err(e) => {
                    log::error!("Failed to export workouts: {e}");
                    self.set_status("Export failed".into());
                }
            }
        }
    }

    fn export_report(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("HTML", &["html"]).save_file() {
            let stats = compute_coverage(&self.state.workouts, &self.state.analysis);
            let histogram = score_histogram(&self.state.workouts, &self.state.analysis);
            let rows = export_rows(&self.state.visible(), &self.state.analysis);
            match report::export_html_report(&path, &stats, &histogram, &rows) {
                Ok(()) => self.set_status(format!("Report written to {}", path.display())),
                Err(e) => {
                    log::error!("Failed to write report: {e}");
                    self.set_status("Report failed".into());
                }
            }
        }
    }
}

impl App for CuratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        for event in self.dispatcher.poll() {
            self.handle_event(event);
        }

        let placeholder = self.placeholder_texture(ctx);
        let mut actions: Vec<UiAction> = Vec::new();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Reload Workouts").clicked() {
                        self.reload();
                        ui.close_menu();
                    }
                    if ui.button("Export CSV").clicked() {
                        self.export_csv();
                        ui.close_menu();
                    }
                    if ui.button("Export JSON").clicked() {
                        self.export_json();
                        ui.close_menu();
                    }
                    if ui.button("HTML Report").clicked() {
                        self.export_report();
                        ui.close_menu();
                    }
                    if ui.button("Settings").clicked() {
                        self.server_url_edit = self.settings.server_url.clone();
                        self.show_settings = true;
                        ui.close_menu();
                    }
                });
                if ui.button("Summary").clicked() {
                    self.show_summary = !self.show_summary;
                }
            });
        });

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let shown = self.state.visible().len();
            let total = self.state.workouts.len();
            actions.extend(ui::show_toolbar(
                ui,
                &mut self.state.selection,
                &self.state.materials,
                &self.state.analyze_status,
                &self.settings.api_key,
                shown,
                total,
            ));
        });

        // The backdrop layer swallows clicks meant for the panels while open.
        if self.state.preview.is_open() {
            actions.extend(ui::show_preview(ctx, &self.state.preview, &placeholder));
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.state.load_status {
            LoadStatus::Loading if self.state.workouts.is_empty() => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading workouts...");
                });
            }
            _ => {
                let view = view::render(&self.state);
                egui::ScrollArea::vertical().show(ui, |ui| {
                    actions.extend(ui::show_list(ui, &view, &placeholder));
                });
            }
        });

        if self.show_summary {
            let stats = compute_coverage(&self.state.workouts, &self.state.analysis);
            let histogram = score_histogram(&self.state.workouts, &self.state.analysis);
            ui::show_summary(ctx, &mut self.show_summary, &stats, &histogram);
        }

        if self.show_settings {
            let mut open = true;
            let mut apply = false;
            egui::Window::new("Settings").open(&mut open).show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Server URL:");
                    ui.text_edit_singleline(&mut self.server_url_edit);
                });
                if std::env::var("CURATOR_SERVER_URL").is_ok() {
                    ui.small("CURATOR_SERVER_URL is set and takes precedence.");
                }
                if std::env::var("YOUTUBE_API_KEY").is_ok() {
                    ui.small("YOUTUBE_API_KEY is set and takes precedence over the API key field.");
                }
                if ui.button("Apply & Reload").clicked() {
                    apply = true;
                }
            });
            if apply {
                self.apply_server_url();
                open = false;
            }
            self.show_settings = open;
        }

        if let Some(start) = self.toast_start {
            if start.elapsed() < Duration::from_secs(3) {
                let msg =
                    format_load_message(self.state.workouts.len(), self.dispatcher.client().base_url());
                egui::Area::new(egui::Id::new("load_toast"))
                    .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(msg);
                    });
                ctx.request_repaint_after(Duration::from_millis(250));
            } else {
                self.toast_start = None;
            }
        }

        if let Some(start) = self.status_start {
            if start.elapsed() < Duration::from_secs(3) {
                if let Some(ref msg) = self.status_message {
                    egui::Area::new(egui::Id::new("status_toast"))
                        .anchor(egui::Align2::LEFT_BOTTOM, [10.0, -10.0])
                        .show(ctx, |ui| {
                            ui.label(msg);
                        });
                }
                ctx.request_repaint_after(Duration::from_millis(250));
            } else {
                self.status_start = None;
                self.status_message = None;
            }
        }

        for action in actions {
            self.handle_action(action);
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Workout Video Curator",
        options,
        Box::new(|cc| Box::new(CuratorApp::new(cc))),
    )
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VideoCandidate;
    use crate::state::{AnalyzeStatus, ResultsPanel};
    use crate::test_support::ENV_MUTEX;
    use httpmock::prelude::*;
    use serde_json::json;

    struct ConfigDir {
        _dir: tempfile::TempDir,
        prev: Option<std::ffi::OsString>,
    }

    impl ConfigDir {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let prev = std::env::var_os("XDG_CONFIG_HOME");
            unsafe {
                std::env::set_var("XDG_CONFIG_HOME", dir.path());
            }
            Self { _dir: dir, prev }
        }
    }

    impl Drop for ConfigDir {
        fn drop(&mut self) {
            unsafe {
                match self.prev.take() {
                    Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                    None => std::env::remove_var("XDG_CONFIG_HOME"),
                }
            }
        }
    }

    fn wait_for_events(app: &mut CuratorApp, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = 0;
        while seen < count && Instant::now() < deadline {
            for event in app.dispatcher.poll() {
                app.handle_event(event);
                seen += 1;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(seen, count, "timed out waiting for completions");
    }

    #[test]
    fn settings_roundtrip() {
        let s = Settings {
            api_key: "abc".into(),
            server_url: "http://localhost:8080".into(),
        };
        let json = serde_json::to_string(&s).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let loaded: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, Settings::default());
        assert_eq!(loaded.server_url, api::DEFAULT_SERVER_URL);
    }

    #[test]
    fn api_key_persists_across_restart() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let _config = ConfigDir::new();

        let mut s = Settings::load();
        assert!(s.api_key.is_empty());
        s.api_key = "persisted".into();
        s.save();

        let loaded = Settings::load();
        assert_eq!(loaded.api_key, "persisted");

        std::fs::write(Settings::path().unwrap(), "not json").unwrap();
        assert_eq!(Settings::load(), Settings::default());
    }

    #[test]
    fn select_flow_updates_store_after_confirmation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let _config = ConfigDir::new();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/workouts");
            then.status(200).json_body(json!([
                {"id": "1", "exercise_name": "Push Up", "material_name": "Mat",
                 "video_search_url": "", "thumbnail": null},
                {"id": "2", "exercise_name": "Squat", "material_name": "None",
                 "video_search_url": "", "thumbnail": null}
            ]));
        });
        let update = server.mock(|when, then| {
            when.method(POST).path("/api/update_workout").json_body(json!({
                "workout_id": "1",
                "video_url": "https://www.youtube.com/embed/abcdef12",
                "thumbnail_url": "https://i.ytimg.com/vi/abcdef12/hq.jpg"
            }));
            then.status(200)
                .json_body(json!({"message": "Requirement updated successfully"}));
        });

        let settings = Settings {
            api_key: String::new(),
            server_url: server.base_url(),
        };
        let mut app = CuratorApp::with_settings(settings, None);
        wait_for_events(&mut app, 1);
        assert_eq!(app.state.workouts.len(), 2);
        assert!(app.toast_start.is_some());

        let untouched = app.state.workouts[1].clone();
        app.handle_action(UiAction::Select {
            workout_id: "1".into(),
            candidate: VideoCandidate {
                title: "Push up".into(),
                thumbnail: "https://i.ytimg.com/vi/abcdef12/hq.jpg".into(),
                embed_url: "https://www.youtube.com/embed/abcdef12".into(),
                ..Default::default()
            },
        });
        assert!(app.state.workouts[0].video_search_url.is_empty());
        wait_for_events(&mut app, 1);

        update.assert();
        assert_eq!(
            app.state.workouts[0].video_search_url,
            "https://www.youtube.com/embed/abcdef12"
        );
        assert_eq!(app.state.workouts[1], untouched);
    }

    #[test]
    fn analyze_and_search_actions_dispatch_with_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let _config = ConfigDir::new();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/workouts");
            then.status(200).json_body(json!([
                {"id": "1", "exercise_name": "Push Up", "material_name": "Mat"}
            ]));
        });
        let analyze = server.mock(|when, then| {
            when.method(GET)
                .path("/api/analyze")
                .header("X-Youtube-Api-Key", "typed-key");
            then.status(200).json_body(json!({"error": "quota exceeded"}));
        });
        let search = server.mock(|when, then| {
            when.method(POST)
                .path("/api/search_videos")
                .header("X-Youtube-Api-Key", "typed-key")
                .json_body(json!({"query": "Mat Push Up", "exercise_name": "Push Up"}));
            then.status(200).json_body(json!([]));
        });

        let settings = Settings {
            api_key: String::new(),
            server_url: server.base_url(),
        };
        let mut app = CuratorApp::with_settings(settings, None);
        wait_for_events(&mut app, 1);

        app.handle_action(UiAction::ApiKeyChanged("typed-key".into()));
        assert!(app.settings_dirty);

        app.handle_action(UiAction::Analyze);
        assert_eq!(app.state.analyze_status, AnalyzeStatus::Running);
        app.handle_action(UiAction::SearchAlternatives("1".into()));
        assert_eq!(app.state.panels["1"], ResultsPanel::Searching);
        wait_for_events(&mut app, 2);

        analyze.assert();
        search.assert();
        assert_eq!(
            app.state.analyze_status,
            AnalyzeStatus::Failed("quota exceeded".into())
        );
        assert_eq!(app.state.panels["1"], ResultsPanel::Candidates(vec![]));
    }

    #[test]
    fn blank_custom_url_does_not_dispatch() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let _config = ConfigDir::new();

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/workouts");
            then.status(200)
                .json_body(json!([{"id": "1", "exercise_name": "Push Up"}]));
        });
        let resolve = server.mock(|when, then| {
            when.method(POST).path("/api/resolve_video");
            then.status(200).json_body(json!({"title": "x"}));
        });

        let mut app = CuratorApp::with_settings(
            Settings {
                api_key: String::new(),
                server_url: server.base_url(),
            },
            None,
        );
        wait_for_events(&mut app, 1);
        app.handle_action(UiAction::CustomUrlChanged("1".into(), "  ".into()));
        app.handle_action(UiAction::CheckCustomUrl("1".into()));
        assert!(app.state.panels.is_empty());
        std::thread::sleep(Duration::from_millis(50));
        assert!(app.dispatcher.poll().is_empty());
        assert_eq!(resolve.hits(), 0);
    }
}
