// Module for egui drawing of the view data; widgets report `UiAction`s instead of touching state
use crate::coverage::{BUCKETS, CoverageStats, bucket_label};
use crate::model::VideoCandidate;
use crate::pipeline::{MaterialFilter, Selection, SortMode};
use crate::preview::PreviewModal;
use crate::state::AnalyzeStatus;
use crate::view::{
    CandidateCard, CardDetails, ListView, ResultsView, ScoreBadge, ScoreLevel, Thumbnail,
    WorkoutCard,
};
use egui::{Color32, RichText, TextureHandle, Vec2};
use egui_plot::{Bar, BarChart, Plot};

const THUMB_SIZE: Vec2 = Vec2::new(120.0, 68.0);
const PREVIEW_SIZE: Vec2 = Vec2::new(480.0, 270.0);
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const DONE_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    ToggleExpanded(String),
    SearchAlternatives(String),
    CustomUrlChanged(String, String),
    CheckCustomUrl(String),
    Select {
        workout_id: String,
        candidate: VideoCandidate,
    },
    Preview(VideoCandidate),
    ClosePreview,
    OpenLink(String),
    Analyze,
    ApiKeyChanged(String),
}

fn thumbnail(ui: &mut egui::Ui, thumb: &Thumbnail, placeholder: &TextureHandle, size: Vec2) {
    if let Thumbnail::Remote(url) = thumb {
        let image = egui::Image::new(url.as_str()).fit_to_exact_size(size);
        if image.load_for_size(ui.ctx(), size).is_ok() {
            ui.add(image);
            return;
        }
    }
    ui.add(egui::Image::new(placeholder).fit_to_exact_size(size));
}

fn badge(ui: &mut egui::Ui, badge: &ScoreBadge) {
    egui::Frame::none()
        .fill(badge.level.color())
        .rounding(4.0)
        .inner_margin(egui::Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| {
            ui.label(
                RichText::new(format!("{}%", badge.score))
                    .color(Color32::WHITE)
                    .strong(),
            );
        });
}

fn tag(ui: &mut egui::Ui, text: &str) {
    if text.is_empty() {
        return;
    }
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(4.0)
        .inner_margin(egui::Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| {
            ui.small(text);
        });
}

/// Top toolbar: search, filter, sort, analysis and API key.
pub fn show_toolbar(
    ui: &mut egui::Ui,
    selection: &mut Selection,
    materials: &[String],
    analyze: &AnalyzeStatus,
    api_key: &str,
    shown: usize,
    total: usize,
) -> Vec<UiAction> {
    let mut actions = Vec::new();
    ui.horizontal_wrapped(|ui| {
        ui.add(
            egui::TextEdit::singleline(&mut selection.search_text)
                .hint_text("Search exercises...")
                .desired_width(220.0),
        );

        egui::ComboBox::from_id_source("material_filter")
            .selected_text(selection.material.label().to_string())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selection.material, MaterialFilter::All, "All materials");
                for m in materials {
                    ui.selectable_value(
                        &mut selection.material,
                        MaterialFilter::Only(m.clone()),
                        m.as_str(),
                    );
                }
            });

        egui::ComboBox::from_id_source("sort_mode")
            .selected_text(selection.sort.label())
            .show_ui(ui, |ui| {
                for mode in SortMode::ALL {
                    ui.selectable_value(&mut selection.sort, mode, mode.label());
                }
            });

        let (label, enabled, failed) = match analyze {
            AnalyzeStatus::Idle => ("Analyze Matches".to_string(), true, false),
            AnalyzeStatus::Running => ("Analyzing...".to_string(), false, false),
            AnalyzeStatus::Done(n) => (format!("Re-analyze ({n} scored)"), true, false),
            AnalyzeStatus::Failed(_) => ("Analysis failed - Retry".to_string(), true, true),
        };
        let text = if failed {
            RichText::new(label).color(ERROR_COLOR)
        } else {
            RichText::new(label)
        };
        let resp = ui.add_enabled(enabled, egui::Button::new(text));
        let resp = match analyze {
            AnalyzeStatus::Failed(msg) => resp.on_hover_text(msg.as_str()),
            _ => resp,
        };
        if resp.clicked() {
            actions.push(UiAction::Analyze);
        }
        if *analyze == AnalyzeStatus::Running {
            ui.spinner();
        }

        ui.separator();
        ui.label("API key:");
        let mut key = api_key.to_string();
        if ui
            .add(
                egui::TextEdit::singleline(&mut key)
                    .password(true)
                    .hint_text("optional")
                    .desired_width(160.0),
            )
            .changed()
        {
            actions.push(UiAction::ApiKeyChanged(key));
        }

        ui.separator();
        ui.label(format!("Showing {shown} of {total}"));
    });
    actions
}

/// Draw every card. The list is rebuilt from `view` on each call.
pub fn show_list(ui: &mut egui::Ui, view: &ListView, placeholder: &TextureHandle) -> Vec<UiAction> {
    let mut actions = Vec::new();
    if view.cards.is_empty() {
        ui.label("No workouts match the current filters.");
    }
    for card in &view.cards {
        ui.push_id(&card.id, |ui| {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                workout_card(ui, card, placeholder, &mut actions);
            });
        });
        ui.add_space(6.0);
    }
    actions
}

fn workout_card(
    ui: &mut egui::Ui,
    card: &WorkoutCard,
    placeholder: &TextureHandle,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        thumbnail(ui, &card.thumbnail, placeholder, THUMB_SIZE);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                let arrow = if card.details.is_some() { "\u{25BC}" } else { "\u{25B6}" };
                let title = RichText::new(format!("{arrow} {}", card.exercise_name)).heading();
                if ui
                    .add(egui::Label::new(title).sense(egui::Sense::click()))
                    .clicked()
                {
                    actions.push(UiAction::ToggleExpanded(card.id.clone()));
                }
                if let Some(b) = &card.badge {
                    badge(ui, b);
                }
            });
            ui.horizontal(|ui| {
                tag(ui, &card.category);
                tag(ui, &card.material);
            });
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if card.done {
                ui.label(RichText::new("\u{2714}").color(DONE_COLOR).size(20.0))
                    .on_hover_text("Video linked");
            } else {
                ui.label(RichText::new("\u{2714}").weak().size(20.0))
                    .on_hover_text("No video linked");
            }
        });
    });

    if let Some(details) = &card.details {
        ui.separator();
        card_details(ui, &card.id, details, placeholder, actions);
    }
}

fn card_details(
    ui: &mut egui::Ui,
    id: &str,
    details: &CardDetails,
    placeholder: &TextureHandle,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new("Instructions:").strong());
        ui.label(&details.instructions);
    });
    ui.horizontal(|ui| {
        ui.label(RichText::new("Current Video:").strong());
        match &details.current_video {
            Some(url) => {
                if ui.link(url).clicked() {
                    actions.push(UiAction::OpenLink(url.clone()));
                }
            }
            None => {
                ui.weak("none");
            }
        }
    });
    if let Some(title) = &details.analyzed_title {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Video title:").strong());
            ui.label(title);
        });
    }
    if let Some(desc) = &details.analyzed_description {
        ui.collapsing("Video description", |ui| {
            ui.label(desc);
        });
    }

    ui.horizontal(|ui| {
        let mut text = details.custom_url.clone();
        let resp = ui.add(
            egui::TextEdit::singleline(&mut text)
                .hint_text("Paste a video URL...")
                .desired_width(280.0),
        );
        if resp.changed() {
            actions.push(UiAction::CustomUrlChanged(id.to_string(), text));
        }
        let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Check URL").clicked() || submitted {
            actions.push(UiAction::CheckCustomUrl(id.to_string()));
        }
        if ui.button("Find Alternatives (Shorts)").clicked() {
            actions.push(UiAction::SearchAlternatives(id.to_string()));
        }
    });

    match &details.results {
        ResultsView::Hidden => {}
        ResultsView::Searching => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Searching...");
            });
        }
        ResultsView::Error(msg) => {
            ui.colored_label(ERROR_COLOR, msg);
        }
        ResultsView::Candidates(cards) if cards.is_empty() => {
            ui.label("No videos found.");
        }
        ResultsView::Candidates(cards) => {
            for c in cards {
                candidate_card(ui, id, c, placeholder, actions);
            }
        }
    }
}

fn candidate_card(
    ui: &mut egui::Ui,
    workout_id: &str,
    card: &CandidateCard,
    placeholder: &TextureHandle,
    actions: &mut Vec<UiAction>,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.horizontal(|ui| {
            thumbnail(ui, &card.thumbnail, placeholder, THUMB_SIZE);
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&card.candidate.title).strong());
                    if let Some(b) = &card.badge {
                        badge(ui, b);
                    }
                });
                if !card.candidate.description.is_empty() {
                    ui.small(&card.candidate.description);
                }
                ui.horizontal(|ui| {
                    let text = if card.select.failed {
                        RichText::new(card.select.label).color(ERROR_COLOR)
                    } else {
                        RichText::new(card.select.label)
                    };
                    if ui
                        .add_enabled(card.select.enabled, egui::Button::new(text))
                        .clicked()
                    {
                        actions.push(UiAction::Select {
                            workout_id: workout_id.to_string(),
                            candidate: card.candidate.clone(),
                        });
                    }
                    if ui.button("Preview").clicked() {
                        actions.push(UiAction::Preview(card.candidate.clone()));
                    }
                });
            });
        });
    });
}

/// Draw the shared preview overlay, if a player is active.
///
/// The backdrop is its own clickable layer above the panels, so a click
/// outside the window closes the preview and never reaches the widgets below.
/// Escape and the close button close it too.
pub fn show_preview(
    ctx: &egui::Context,
    modal: &PreviewModal,
    placeholder: &TextureHandle,
) -> Vec<UiAction> {
    let mut actions = Vec::new();
    let Some(player) = modal.player() else {
        return actions;
    };

    let screen = ctx.screen_rect();
    let backdrop = egui::Area::new(egui::Id::new("preview_backdrop"))
        .order(egui::Order::Middle)
        .fixed_pos(screen.min)
        .show(ctx, |ui| {
            ui.painter()
                .rect_filled(screen, 0.0, Color32::from_black_alpha(160));
            ui.allocate_rect(screen, egui::Sense::click())
        })
        .inner;

    egui::Area::new(egui::Id::new("preview_modal"))
        .order(egui::Order::Foreground)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Frame::window(ui.style()).show(ui, |ui| {
                ui.heading("Preview");
                ui.separator();
                let thumb = if player.thumbnail.is_empty() {
                    Thumbnail::Placeholder
                } else {
                    Thumbnail::Remote(player.thumbnail.clone())
                };
                thumbnail(ui, &thumb, placeholder, PREVIEW_SIZE);
                ui.label(RichText::new(&player.title).strong());
                ui.small(&player.embed_url);
                ui.horizontal(|ui| {
                    if ui.button("\u{25B6} Play in browser").clicked() {
                        actions.push(UiAction::OpenLink(player.watch_url()));
                    }
                    if ui.button("Close").clicked() {
                        actions.push(UiAction::ClosePreview);
                    }
                });
            });
        });

    if backdrop.clicked() || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        actions.push(UiAction::ClosePreview);
    }
    actions
}

/// Coverage summary window with a score histogram.
pub fn show_summary(
    ctx: &egui::Context,
    open: &mut bool,
    stats: &CoverageStats,
    histogram: &[usize; BUCKETS],
) {
    egui::Window::new("Summary").open(open).show(ctx, |ui| {
        egui::Grid::new("coverage_grid").striped(true).show(ui, |ui| {
            ui.label("Total workouts");
            ui.label(stats.total_workouts.to_string());
            ui.end_row();
            ui.label("With video");
            ui.label(stats.linked.to_string());
            ui.end_row();
            ui.label("Without video");
            ui.label(stats.unlinked.to_string());
            ui.end_row();
            ui.label("Analyzed");
            ui.label(stats.analyzed.to_string());
            ui.end_row();
            ui.label("Poor / Fair / Good");
            ui.label(format!(
                "{} / {} / {}",
                stats.poor_matches, stats.fair_matches, stats.good_matches
            ));
            ui.end_row();
            ui.label("Average score");
            ui.label(
                stats
                    .avg_score
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or_else(|| "-".into()),
            );
            ui.end_row();
            ui.label("Worst match");
            ui.label(stats.worst_match.clone().unwrap_or_else(|| "-".into()));
            ui.end_row();
        });

        let bars: Vec<Bar> = histogram
            .iter()
            .enumerate()
            .map(|(i, count)| {
                Bar::new(i as f64, *count as f64)
                    .name(bucket_label(i))
                    .fill(ScoreLevel::for_score(i as i64 * 20).color())
            })
            .collect();
        Plot::new("score_histogram")
            .height(200.0)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .x_axis_formatter(|mark, _chars, _| {
                let idx = mark.value.round();
                if idx >= 0.0 && (idx as usize) < BUCKETS && (mark.value - idx).abs() < 1e-6 {
                    bucket_label(idx as usize)
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name("Workouts"));
            });
    });
}
