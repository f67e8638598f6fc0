//! Errors raised while driving ffmpeg and ffprobe.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

/// Failure of one ffmpeg/ffprobe invocation or its surrounding file checks.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg executable not found on PATH")]
    FfmpegNotFound,

    #[error("ffprobe executable not found on PATH")]
    FfprobeNotFound,

    /// Non-zero exit; `stderr` holds the last lines of output
    #[error("ffmpeg failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("no such file: {0}")]
    FileNotFound(PathBuf),

    /// Clean exit but nothing usable was written
    #[error("clip output missing or empty: {0}")]
    MissingOutput(PathBuf),

    #[error("cannot extract start {start:.3}s duration {duration:.3}s")]
    InvalidRange { start: f64, duration: f64 },

    #[error("cancelled")]
    Cancelled,

    #[error("ffmpeg killed after {0}s timeout")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("not a usable video: {0}")]
    InvalidVideo(String),

    #[error("{0}")]
    Internal(String),
}

impl MediaError {
    /// Non-zero ffmpeg exit.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the run was cancelled rather than ffmpeg failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MediaError::Cancelled)
    }
}
