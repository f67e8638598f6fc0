//! Pipeline counters.
//!
//! Recorded through the `metrics` facade; installing a recorder is up to the embedding process.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const CLIPS_TOTAL: &str = "playclip_clips_total";
    pub const SIDECARS_TOTAL: &str = "playclip_sidecars_total";
}

/// Outcome label values.
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const FAILED: &str = "failed";
    pub const INVALID_RANGE: &str = "invalid_range";
    pub const MISSING_CLIP: &str = "missing_clip";
    pub const CANCELLED: &str = "cancelled";
}

/// Record the outcome of one planned clip.
pub fn record_clip(outcome: &'static str) {
    counter!(names::CLIPS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record the outcome of one sidecar write.
pub fn record_sidecar(outcome: &'static str) {
    counter!(names::SIDECARS_TOTAL, "outcome" => outcome).increment(1);
}
