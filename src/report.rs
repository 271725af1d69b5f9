use crate::{
    coverage::{BUCKETS, CoverageStats, bucket_label},
    export::ExportRow,
};
use maud::{Markup, html};
use plotters::prelude::*;
use std::path::Path;

/// Rows with a score below this, or without a video, are listed as needing attention.
const ATTENTION_SCORE: i64 = 80;

trait FormatOption {
    fn fmt_opt(self) -> String;
}

impl FormatOption for Option<f32> {
    fn fmt_opt(self) -> String {
        self.map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".into())
    }
}

impl FormatOption for Option<i64> {
    fn fmt_opt(self) -> String {
        self.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
    }
}

pub fn export_html_report<P: AsRef<Path>>(
    path: P,
    stats: &CoverageStats,
    histogram: &[usize; BUCKETS],
    rows: &[ExportRow],
) -> std::io::Result<()> {
    let path = path.as_ref();
    let chart_path = path.with_extension("png");
    let chart_file = match generate_score_chart(histogram, &chart_path) {
        Ok(_) => chart_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("")),
        Err(e) => {
            log::error!("Failed to generate chart: {}", e);
            std::ffi::OsStr::new("")
        }
    };
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let markup = build_html(stats, rows, chart_file, &generated);
    std::fs::write(path, markup.into_string())
}

fn generate_score_chart(
    histogram: &[usize; BUCKETS],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;
    let max = histogram.iter().copied().max().unwrap_or(0);
    if max == 0 {
        root.present()?;
        return Ok(());
    }
    let mut chart = ChartBuilder::on(&root)
        .caption("Match Score Distribution", ("sans-serif", 25))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0f32..BUCKETS as f32, 0f32..max as f32 * 1.1)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(BUCKETS)
        .x_label_formatter(&|x| bucket_label((*x as usize).min(BUCKETS - 1)))
        .x_desc("Match score")
        .y_desc("Workouts")
        .draw()?;
    chart.draw_series(histogram.iter().enumerate().map(|(i, count)| {
        let x = i as f32;
        Rectangle::new([(x + 0.1, 0.0), (x + 0.9, *count as f32)], BLUE.filled())
    }))?;
    root.present()?;
    Ok(())
}

fn needs_attention(row: &ExportRow) -> bool {
    row.video_url.is_empty() || row.match_score.is_some_and(|s| s < ATTENTION_SCORE)
}

fn build_html(
    stats: &CoverageStats,
    rows: &[ExportRow],
    chart_file: &std::ffi::OsStr,
    generated: &str,
) -> Markup {
    html! {
        html {
            head { meta charset="utf-8"; title { "Workout Video Report" } }
            body {
                p { "Generated " (generated) }
                h1 { "Coverage" }
                table border="1" {
                    tr { th { "Total Workouts" } td { (stats.total_workouts) } }
                    tr { th { "With Video" } td { (stats.linked) } }
                    tr { th { "Without Video" } td { (stats.unlinked) } }
                    tr { th { "Analyzed" } td { (stats.analyzed) } }
                    tr { th { "Poor / Fair / Good" } td { (stats.poor_matches) " / " (stats.fair_matches) " / " (stats.good_matches) } }
                    tr { th { "Average Score" } td { (stats.avg_score.fmt_opt()) } }
                    tr { th { "Worst Match" } td { (stats.worst_match.clone().unwrap_or_default()) } }
                }
                h1 { "Needs Attention" }
                table border="1" {
                    tr { th { "Exercise" } th { "Material" } th { "Score" } th { "Current Video" } }
                    @for row in rows.iter().filter(|r| needs_attention(r)) {
                        tr {
                            td { (row.exercise_name) }
                            td { (row.material_name) }
                            td { (row.match_score.fmt_opt()) }
                            td {
                                @if row.video_url.is_empty() {
                                    "none"
                                } @else {
                                    a href=(row.video_url) { (row.video_url) }
                                }
                            }
                        }
                    }
                }
                h1 { "Score Distribution" }
                @if chart_file.is_empty() {
                    p { "Chart unavailable" }
                } @else {
                    img src=(chart_file.to_string_lossy());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn row(name: &str, video: &str, score: Option<i64>) -> ExportRow {
        ExportRow {
            id: name.into(),
            exercise_name: name.into(),
            category: String::new(),
            material_name: "Mat".into(),
            video_url: video.into(),
            thumbnail: String::new(),
            match_score: score,
            analyzed_title: None,
        }
    }

    #[test]
    fn format_option_values() {
        assert_eq!(None::<f32>.fmt_opt(), "-");
        assert_eq!(Some(55.54_f32).fmt_opt(), "55.5");
        assert_eq!(Some(30_i64).fmt_opt(), "30");
        assert_eq!(None::<i64>.fmt_opt(), "-");
    }

    #[test]
    fn build_html_lists_only_rows_needing_attention() {
        let stats = CoverageStats {
            total_workouts: 3,
            linked: 2,
            unlinked: 1,
            analyzed: 2,
            poor_matches: 1,
            fair_matches: 0,
            good_matches: 1,
            avg_score: Some(57.5),
            worst_match: Some("Bad Match".into()),
        };
        let rows = vec![
            row("Fine Match", "https://v/1", Some(95)),
            row("Bad Match", "https://v/2", Some(20)),
            row("No Video", "", None),
        ];

        let output = build_html(&stats, &rows, OsStr::new("report.png"), "2026-01-01 10:00")
            .into_string();

        assert!(output.contains("Bad Match"));
        assert!(output.contains("No Video"));
        assert!(!output.contains("Fine Match"));
        assert!(output.contains("57.5"));
        assert!(output.contains("<td>none</td>"));
        assert!(output.contains("<img src=\"report.png\">"));
    }

    #[test]
    fn build_html_handles_empty_chart_file() {
        let output = build_html(&CoverageStats::default(), &[], OsStr::new(""), "now")
            .into_string();
        assert!(output.contains("Chart unavailable"));
        assert!(!output.contains("<img"));
    }
}
