//! Import table for a folder of clips.
//!
//! Lists the clips of a folder back to back on one timeline, as needed when
//! the clips are concatenated into one video and annotated there.

use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{info, warn};

use playclip_media::probe_video;
use playclip_models::{DURATION_COLUMN, POSITION_COLUMN};

use crate::error::{WorkerError, WorkerResult};

/// File name of the generated table.
pub const IMPORT_TABLE_NAME: &str = "import.csv";

/// One row of the import table (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    #[serde(rename = "Position")]
    pub position_ms: u64,
    #[serde(rename = "Duration")]
    pub duration_ms: u64,
}

/// Cumulative positions for clips of the given durations (seconds).
pub fn import_rows(durations_secs: &[f64]) -> Vec<ImportRow> {
    let mut position_ms = 0u64;
    durations_secs
        .iter()
        .map(|d| {
            let duration_ms = (d.max(0.0) * 1000.0).round() as u64;
            let row = ImportRow {
                position_ms,
                duration_ms,
            };
            position_ms += duration_ms;
            row
        })
        .collect()
}

/// Write rows with `Position` and `Duration` headers.
pub fn write_import_table(path: &Path, rows: &[ImportRow]) -> WorkerResult<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    if rows.is_empty() {
        writer.write_record([POSITION_COLUMN, DURATION_COLUMN])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Video files in `dir` with extension `ext`, sorted by name.
pub fn list_clips(dir: &Path, ext: &str) -> WorkerResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(WorkerError::SourceNotFound(dir.to_path_buf()));
    }
    let mut clips: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
                .unwrap_or(false)
        })
        .collect();
    clips.sort();
    Ok(clips)
}

/// Probe every clip in `clips_dir` and write `import.csv` there.
pub async fn build_import_table(clips_dir: &Path, clip_extension: &str) -> WorkerResult<PathBuf> {
    let clips = list_clips(clips_dir, clip_extension)?;
    if clips.is_empty() {
        warn!(dir = %clips_dir.display(), "No clips found for import table");
    }

    let mut durations = Vec::with_capacity(clips.len());
    for clip in &clips {
        let info = probe_video(clip).await?;
        durations.push(info.duration);
    }

    let path = clips_dir.join(IMPORT_TABLE_NAME);
    write_import_table(&path, &import_rows(&durations))?;
    info!(path = %path.display(), clips = clips.len(), "Wrote import table");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::event_table::read_events;

    #[test]
    fn test_cumulative_rows() {
        let rows = import_rows(&[2.5, 10.0, 0.75]);
        assert_eq!(
            rows,
            vec![
                ImportRow { position_ms: 0, duration_ms: 2500 },
                ImportRow { position_ms: 2500, duration_ms: 10000 },
                ImportRow { position_ms: 12500, duration_ms: 750 },
            ]
        );
    }

    #[test]
    fn test_table_reads_back_as_events() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(IMPORT_TABLE_NAME);
        write_import_table(&path, &import_rows(&[1.0, 2.0])).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].position_ms, 1000);
        assert_eq!(events[1].duration_ms, 2000);
    }

    #[test]
    fn test_list_clips_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        for name in ["Play_002.mp4", "Play_001.MP4", "Play_001.dartclip", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }
        let clips = list_clips(temp.path(), "mp4").unwrap();
        let names: Vec<String> = clips
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Play_001.MP4", "Play_002.mp4"]);

        assert!(matches!(
            list_clips(&temp.path().join("missing"), "mp4"),
            Err(WorkerError::SourceNotFound(_))
        ));
    }
}
