//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use playclip_models::{ConfigError, FieldError};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Schema error: required column '{missing}' not found")]
    Schema { missing: String },

    #[error("Invalid value in row {row}, column '{column}': '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Event table contains no events")]
    NoEvents,

    #[error("Invalid time range for clip {clip_number}: start {start:.3}s, duration {duration:.3}s")]
    InvalidTimeRange {
        clip_number: u32,
        start: f64,
        duration: f64,
    },

    #[error("Transcode failed: {0}")]
    Transcode(playclip_media::MediaError),

    #[error("Sidecar write failed for {path}: {message}")]
    SidecarWrite { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Media error: {0}")]
    Media(#[from] playclip_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn sidecar_write(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::SidecarWrite {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Map a field lookup failure on data row `row` (1-based).
    pub fn from_field(err: FieldError, row: usize) -> Self {
        match err {
            FieldError::Missing(missing) => Self::Schema { missing },
            FieldError::InvalidMillis { column, value } => Self::InvalidValue { row, column, value },
        }
    }

    /// Input-stage errors abort the whole run; everything else is per clip.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkerError::SourceNotFound(_)
                | WorkerError::Schema { .. }
                | WorkerError::InvalidValue { .. }
                | WorkerError::NoEvents
                | WorkerError::Config(_)
                | WorkerError::Csv(_)
        )
    }
}

impl From<ConfigError> for WorkerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
