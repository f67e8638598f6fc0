//! Pipeline run state and result reporting.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pipeline state machine.
///
/// `Idle -> EventsLoaded -> {SplittingClips | GeneratingSidecarsOnly} -> Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    EventsLoaded,
    SplittingClips,
    GeneratingSidecarsOnly,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::EventsLoaded => "events_loaded",
            RunState::SplittingClips => "splitting_clips",
            RunState::GeneratingSidecarsOnly => "generating_sidecars_only",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, EventsLoaded)
                | (Idle, Failed)
                | (EventsLoaded, SplittingClips)
                | (EventsLoaded, GeneratingSidecarsOnly)
                | (EventsLoaded, Completed)
                | (EventsLoaded, Failed)
                | (SplittingClips, Completed)
                | (GeneratingSidecarsOnly, Completed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which of the two workflows a run executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// Cut clips (and optionally write sidecars)
    Split,
    /// Write sidecars for clips already on disk
    SidecarsOnly,
    /// Neither splitting nor sidecars requested
    Nothing,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Workflow::Split => "split",
            Workflow::SidecarsOnly => "sidecars_only",
            Workflow::Nothing => "nothing",
        };
        write!(f, "{}", s)
    }
}

/// Category of a per-clip failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClipFailureKind {
    InvalidTimeRange,
    Transcode,
    SidecarWrite,
    Cancelled,
}

/// A clip that was attempted but did not succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipFailure {
    pub clip_number: u32,
    pub kind: ClipFailureKind,
    pub message: String,
}

/// Aggregate result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    /// Terminal state
    pub state: RunState,
    pub workflow: Workflow,
    /// Folder holding the clips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Planned items, including ones rejected for their time range
    pub attempted: usize,
    /// Items whose every requested side effect succeeded
    pub succeeded: usize,
    /// Sidecar documents written
    pub sidecars_written: usize,
    /// Sidecars-only runs: clips not found on disk
    pub missing_clips: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ClipFailure>,
    /// Input-stage error that failed the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Empty report for a run that is about to start.
    pub fn new(workflow: Workflow, output_dir: Option<PathBuf>) -> Self {
        Self {
            state: RunState::Idle,
            workflow,
            output_dir,
            attempted: 0,
            succeeded: 0,
            sidecars_written: 0,
            missing_clips: 0,
            failures: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the run finished in the given terminal state.
    pub fn finish(mut self, state: RunState) -> Self {
        self.state = state;
        self.finished_at = Some(Utc::now());
        self
    }

    /// Mark the run failed with an input-stage error.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.finish(RunState::Failed)
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}
