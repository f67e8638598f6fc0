//! Scene list import and export.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{ReaderBuilder, Trim, WriterBuilder};

use playclip_media::{MediaError, MediaResult, SceneSource};
use playclip_models::{EventFields, Scene};

use crate::error::{WorkerError, WorkerResult};
use crate::scene_filter::LabeledScene;

const START_FRAME_COLUMN: &str = "Start Frame";
const END_FRAME_COLUMN: &str = "End Frame";
const TIMECODE_LIST_PREFIX: &str = "Timecode List";

/// Read a scene list CSV as exported by PySceneDetect.
///
/// Frame numbers in that format are 1-based and inclusive. An optional
/// leading `Timecode List` line is skipped.
pub fn read_scene_list(path: impl AsRef<Path>, frame_rate: f64) -> WorkerResult<Vec<Scene>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(WorkerError::SourceNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_scene_list(&text, frame_rate)
}

/// Parse scene list text.
pub fn parse_scene_list(text: &str, frame_rate: f64) -> WorkerResult<Vec<Scene>> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(WorkerError::config_error(format!(
            "frame rate must be positive, got {}",
            frame_rate
        )));
    }

    let body = match text.lines().next() {
        Some(first) if first.trim_start().starts_with(TIMECODE_LIST_PREFIX) => {
            text.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
        }
        _ => text,
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: EventFields = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i.to_string()))
        .collect();
    let column = |name: &str| -> WorkerResult<usize> {
        headers
            .require(name)
            .map_err(|e| WorkerError::from_field(e, 0))?
            .parse()
            .map_err(|_| WorkerError::Schema {
                missing: name.to_string(),
            })
    };
    let start_col = column(START_FRAME_COLUMN)?;
    let end_col = column(END_FRAME_COLUMN)?;

    let mut scenes = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let frame = |col: usize, name: &str| -> WorkerResult<u64> {
            let value = record.get(col).unwrap_or("");
            value.parse().map_err(|_| WorkerError::InvalidValue {
                row,
                column: name.to_string(),
                value: value.to_string(),
            })
        };
        let start = frame(start_col, START_FRAME_COLUMN)?;
        let end = frame(end_col, END_FRAME_COLUMN)?;

        // 1-based inclusive -> 0-based half-open
        if let Some(scene) = Scene::new(start.saturating_sub(1), end, frame_rate) {
            scenes.push(scene);
        }
    }
    Ok(scenes)
}

/// Write labeled scenes with columns `Name, Start Time, End Time, Duration, Angle`.
pub fn write_scene_csv(path: impl AsRef<Path>, scenes: &[LabeledScene]) -> WorkerResult<()> {
    let mut writer = WriterBuilder::new().from_path(path.as_ref())?;
    writer.write_record(["Name", "Start Time", "End Time", "Duration", "Angle"])?;
    for labeled in scenes {
        writer.write_record([
            labeled.play_name(),
            format!("{:.3}", labeled.scene.start_seconds()),
            format!("{:.3}", labeled.scene.end_seconds()),
            format!("{:.3}", labeled.scene.duration_seconds()),
            labeled.angle.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// `<dir>/<stem><suffix>.csv` beside the video.
pub fn scene_csv_path(video: &Path, suffix: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    video.with_file_name(format!("{}{}.csv", stem, suffix))
}

/// [`SceneSource`] backed by a scene list file.
#[derive(Debug, Clone)]
pub struct SceneListFile {
    pub path: PathBuf,
    pub frame_rate: f64,
}

#[async_trait]
impl SceneSource for SceneListFile {
    async fn scenes(&self, _video: &Path) -> MediaResult<Vec<Scene>> {
        read_scene_list(&self.path, self.frame_rate).map_err(|e| match e {
            WorkerError::SourceNotFound(path) => MediaError::FileNotFound(path),
            other => MediaError::internal(format!(
                "scene list {}: {}",
                self.path.display(),
                other
            )),
        })
    }
}
