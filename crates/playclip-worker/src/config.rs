//! Process configuration.

use std::time::Duration;

use playclip_models::encoding::DEFAULT_CLIP_EXTENSION;

/// Default sidecar extension understood by the annotation tool.
pub const DEFAULT_SIDECAR_EXTENSION: &str = "dartclip";

/// Process-level settings, separate from the per-run [`playclip_models::RunConfig`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Clips processed concurrently (1 keeps the sequential order)
    pub max_parallel: usize,
    /// Upper bound for one transcoder invocation
    pub transcode_timeout: Duration,
    /// Container extension of produced clips
    pub clip_extension: String,
    /// Extension of metadata sidecars
    pub sidecar_extension: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            transcode_timeout: Duration::from_secs(600),
            clip_extension: DEFAULT_CLIP_EXTENSION.to_string(),
            sidecar_extension: DEFAULT_SIDECAR_EXTENSION.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_parallel: std::env::var("PLAYCLIP_MAX_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(1),
            transcode_timeout: Duration::from_secs(
                std::env::var("PLAYCLIP_TRANSCODE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            clip_extension: std::env::var("PLAYCLIP_CLIP_EXTENSION")
                .ok()
                .map(|s| s.trim_start_matches('.').to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CLIP_EXTENSION.to_string()),
            sidecar_extension: std::env::var("PLAYCLIP_SIDECAR_EXTENSION")
                .ok()
                .map(|s| s.trim_start_matches('.').to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SIDECAR_EXTENSION.to_string()),
        }
    }

    pub fn with_max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n.max(1);
        self
    }
}
