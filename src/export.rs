use crate::model::{AnalysisCache, Workout};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One exported line: a workout joined with its analysis, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub id: String,
    pub exercise_name: String,
    pub category: String,
    pub material_name: String,
    pub video_url: String,
    pub thumbnail: String,
    pub match_score: Option<i64>,
    pub analyzed_title: Option<String>,
}

pub fn export_rows(workouts: &[&Workout], analysis: &AnalysisCache) -> Vec<ExportRow> {
    workouts
        .iter()
        .map(|w| {
            let result = analysis.get(&w.id);
            ExportRow {
                id: w.id.clone(),
                exercise_name: w.exercise_name.clone(),
                category: w.category.clone(),
                material_name: w.material_name.clone(),
                video_url: w.video_search_url.clone(),
                thumbnail: w.thumbnail.clone().unwrap_or_default(),
                match_score: result.map(|r| r.match_score),
                analyzed_title: result.map(|r| r.title.clone()).filter(|t| !t.is_empty()),
            }
        })
        .collect()
}

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_rows_csv<P: AsRef<Path>>(path: P, rows: &[ExportRow]) -> csv::Result<()> {
    write_csv(std::fs::File::create(path)?, rows)
}

pub fn save_rows_json<P: AsRef<Path>>(path: P, rows: &[ExportRow]) -> std::io::Result<()> {
    write_json(rows, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalysisResult;

    fn rows() -> Vec<ExportRow> {
        let workouts = vec![
            Workout {
                id: "1".into(),
                exercise_name: "Push Up".into(),
                category: "Chest".into(),
                material_name: "Mat".into(),
                video_search_url: "https://www.youtube.com/embed/a".into(),
                thumbnail: Some("a.jpg".into()),
                ..Default::default()
            },
            Workout {
                id: "2".into(),
                exercise_name: "Squat, Goblet".into(),
                material_name: "Kettlebell".into(),
                ..Default::default()
            },
        ];
        let mut cache = AnalysisCache::new();
        cache.insert(
            "1".into(),
            AnalysisResult {
                match_score: 42,
                title: "Push up tutorial".into(),
                description: String::new(),
            },
        );
        let refs: Vec<&Workout> = workouts.iter().collect();
        export_rows(&refs, &cache)
    }

    #[test]
    fn rows_join_analysis() {
        let rows = rows();
        assert_eq!(rows[0].match_score, Some(42));
        assert_eq!(rows[0].analyzed_title.as_deref(), Some("Push up tutorial"));
        assert_eq!(rows[1].match_score, None);
        assert_eq!(rows[1].thumbnail, "");
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,exercise_name,category,material_name,video_url,thumbnail,match_score,analyzed_title")
        );
        assert_eq!(
            lines.next(),
            Some("1,Push Up,Chest,Mat,https://www.youtube.com/embed/a,a.jpg,42,Push up tutorial")
        );
        assert_eq!(lines.next(), Some("2,\"Squat, Goblet\",,Kettlebell,,,,"));
    }

    #[test]
    fn json_file_roundtrips_to_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.json");
        save_rows_json(&path, &rows()).unwrap();
        let data: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(data[0]["match_score"], 42);
        assert!(data[1]["match_score"].is_null());
    }

    #[test]
    fn csv_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.csv");
        save_rows_csv(&path, &rows()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
