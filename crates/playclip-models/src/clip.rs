//! Clip plans and output naming.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Prefix of every generated clip file.
pub const CLIP_NAME_PREFIX: &str = "Play_";

/// Output file name for a clip number: `Play_{n:03}.{ext}`.
pub fn clip_file_name(clip_number: u32, extension: &str) -> String {
    format!("{}{:03}.{}", CLIP_NAME_PREFIX, clip_number, extension)
}

/// Name of the per-source folder that receives the clips: `<stem> Clips`.
pub fn clips_folder_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    format!("{} Clips", stem)
}

/// A resolved unit of work: one event mapped to one output clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipPlan {
    /// Zero-based position of the source event in the input table
    pub index: usize,
    /// `index + start_number`, used for output naming
    pub clip_number: u32,
    /// Seek position in the source video (seconds)
    pub start_seconds: f64,
    /// Clip length including the trailing buffer (seconds)
    pub duration_seconds: f64,
    /// Destination clip file
    pub output_path: PathBuf,
}

impl ClipPlan {
    /// Clip file name without directory.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Clip file name without extension; the sidecar display name.
    pub fn display_name(&self) -> String {
        self.output_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Sidecar path: the clip path with its extension swapped.
    pub fn sidecar_path(&self, sidecar_extension: &str) -> PathBuf {
        self.output_path.with_extension(sidecar_extension)
    }

    /// End of the clip in the source video (seconds).
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}
