//! Transcode progress reported by FFmpeg's `-progress pipe:2` stream.

use serde::{Deserialize, Serialize};

/// One progress snapshot, emitted each time FFmpeg writes a `progress=` line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as `HH:MM:SS.micro`
    pub out_time: String,
    /// Encoding speed relative to realtime
    pub speed: f64,
    /// Set on the final `progress=end` snapshot
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of a clip of `clip_seconds` written so far, in `[0, 100]`.
    pub fn percent_of(&self, clip_seconds: f64) -> f64 {
        if self.is_complete {
            return 100.0;
        }
        if clip_seconds <= 0.0 {
            return 0.0;
        }
        let done = self.out_time_ms.max(0) as f64 / 1000.0;
        (done / clip_seconds * 100.0).min(100.0)
    }
}
