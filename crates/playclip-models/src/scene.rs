//! Detected scenes, scene triads and camera-angle labels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default upper bound for the intro scene of a triad (seconds).
pub const DEFAULT_SHORT_MAX_SECS: f64 = 2.5;
/// Default relative tolerance between the two camera-angle scenes.
pub const DEFAULT_TOLERANCE: f64 = 0.3;

/// A detected shot boundary interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub start_frame: u64,
    pub end_frame: u64,
    pub frame_rate: f64,
}

impl Scene {
    /// Create a scene. Returns `None` unless `end_frame > start_frame` and the
    /// frame rate is positive.
    pub fn new(start_frame: u64, end_frame: u64, frame_rate: f64) -> Option<Self> {
        if end_frame <= start_frame || !(frame_rate > 0.0) || !frame_rate.is_finite() {
            return None;
        }
        Some(Self {
            start_frame,
            end_frame,
            frame_rate,
        })
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_frame as f64 / self.frame_rate
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_frame as f64 / self.frame_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end_frame - self.start_frame) as f64 / self.frame_rate
    }
}

/// Acceptance thresholds for the intro + two-angle pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TriadCriteria {
    /// The first scene must be strictly shorter than this (seconds)
    #[serde(default = "default_short_max")]
    pub short_max_secs: f64,
    /// Allowed |b - c| as a fraction of min(b, c)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_short_max() -> f64 {
    DEFAULT_SHORT_MAX_SECS
}
fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for TriadCriteria {
    fn default() -> Self {
        Self {
            short_max_secs: DEFAULT_SHORT_MAX_SECS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl TriadCriteria {
    /// Check three scene durations against the pattern.
    pub fn accepts(&self, a: f64, b: f64, c: f64) -> bool {
        a < self.short_max_secs && (b - c).abs() <= self.tolerance * b.min(c)
    }
}

/// Three consecutive scenes forming one play: intro plus two camera angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneTriad {
    /// Position of `intro` in the scene sequence the triad was found in
    pub offset: usize,
    pub intro: Scene,
    pub first_angle: Scene,
    pub second_angle: Scene,
}

impl SceneTriad {
    pub fn scenes(&self) -> [Scene; 3] {
        [self.intro, self.first_angle, self.second_angle]
    }
}

/// Ordered camera-angle labels applied round-robin to accepted scenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AngleLabels(Vec<String>);

impl Default for AngleLabels {
    fn default() -> Self {
        Self::three_angles()
    }
}

impl AngleLabels {
    /// Custom label list. Returns `None` for an empty list.
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    /// Score board, sideline and end zone.
    pub fn three_angles() -> Self {
        Self(vec![
            "Score Board".to_string(),
            "All 22".to_string(),
            "Endzone".to_string(),
        ])
    }

    /// Sideline and end zone only.
    pub fn two_angles() -> Self {
        Self(vec!["All 22".to_string(), "Endzone".to_string()])
    }

    /// Label for the scene at flat position `i`.
    pub fn label_for(&self, i: usize) -> &str {
        self.0
            .get(i % self.0.len().max(1))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
