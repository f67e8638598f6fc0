//! Pipeline orchestrator.
//!
//! `Idle -> EventsLoaded -> {SplittingClips | GeneratingSidecarsOnly} -> Completed | Failed`
//!
//! Only input-stage errors fail a run. Per-clip failures are counted in the
//! report and the run still completes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{watch, Semaphore};
use tracing::Instrument;

use playclip_media::fs_utils::ensure_dir;
use playclip_media::{ExtractMode, Transcoder};
use playclip_models::{
    clips_folder_name, ClipFailureKind, ClipPlan, Event, RunConfig, RunReport, RunState, Workflow,
};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::event_table::read_events;
use crate::logging::RunLogger;
use crate::metrics::{self, outcome};

pub mod clip;
pub mod tasks;

pub use clip::ClipOutcome;
pub use tasks::plan;

use clip::{process_existing_clip, process_split_clip, ClipContext};

/// Where the events of a run come from.
#[derive(Debug, Clone)]
pub enum EventSource {
    /// Delimited table on disk
    Table(PathBuf),
    /// Events built in memory, e.g. from accepted scenes
    Events(Vec<Event>),
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub events: EventSource,
    /// Source video; required when splitting
    pub video: Option<PathBuf>,
    /// Folder that holds (or receives) the clips
    pub clips_dir: PathBuf,
}

impl RunRequest {
    /// Split request writing into `<output_root>/<video stem> Clips`.
    ///
    /// `output_root` defaults to the folder of the video.
    pub fn split(events: EventSource, video: impl Into<PathBuf>, output_root: Option<&Path>) -> Self {
        let video = video.into();
        let clips_dir = default_clips_dir(&video, output_root);
        Self {
            events,
            video: Some(video),
            clips_dir,
        }
    }

    /// Sidecar-only request for clips already in `clips_dir`.
    pub fn sidecars(events: EventSource, clips_dir: impl Into<PathBuf>) -> Self {
        Self {
            events,
            video: None,
            clips_dir: clips_dir.into(),
        }
    }
}

/// `<output_root or video folder>/<video stem> Clips`.
pub fn default_clips_dir(video: &Path, output_root: Option<&Path>) -> PathBuf {
    let root = output_root
        .map(Path::to_path_buf)
        .or_else(|| video.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    root.join(clips_folder_name(video))
}

/// Workflow selected by a run configuration.
pub fn select_workflow(config: &RunConfig) -> Workflow {
    match (config.split_video, config.create_metadata) {
        (true, _) => Workflow::Split,
        (false, true) => Workflow::SidecarsOnly,
        (false, false) => Workflow::Nothing,
    }
}

/// Runs the clip workflows against a [`Transcoder`].
#[derive(Clone)]
pub struct Pipeline {
    transcoder: Arc<dyn Transcoder>,
    worker: WorkerConfig,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Pipeline {
    pub fn new(transcoder: Arc<dyn Transcoder>, worker: WorkerConfig) -> Self {
        Self {
            transcoder,
            worker,
            cancel_rx: None,
        }
    }

    /// Stop starting new clips once the receiver flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// Execute one run and report its terminal state.
    pub async fn run(&self, request: &RunRequest, config: &RunConfig) -> RunReport {
        let workflow = select_workflow(config);
        let logger = RunLogger::new(workflow);
        let span = logger.create_span();

        self.run_inner(request, config, workflow, &logger)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        request: &RunRequest,
        config: &RunConfig,
        workflow: Workflow,
        logger: &RunLogger,
    ) -> RunReport {
        let mut report = RunReport::new(workflow, Some(request.clips_dir.clone()));
        logger.log_start(&format!("clips folder {}", request.clips_dir.display()));

        // Idle -> EventsLoaded | Failed
        let events = match self.load_inputs(request, config, workflow) {
            Ok(events) => events,
            Err(e) => {
                logger.log_error(&e.to_string());
                return report.fail(e.to_string());
            }
        };
        transition(&mut report, RunState::EventsLoaded);
        logger.log_progress(&format!("{} events loaded", events.len()));

        let next = match workflow {
            Workflow::Split => RunState::SplittingClips,
            Workflow::SidecarsOnly => RunState::GeneratingSidecarsOnly,
            Workflow::Nothing => {
                logger.log_warning("neither splitting nor sidecars requested, nothing to do");
                return report.finish(RunState::Completed);
            }
        };

        if workflow == Workflow::Split {
            if let Err(e) = ensure_dir(&request.clips_dir).await {
                logger.log_error(&format!("cannot create clips folder: {}", e));
                return report.fail(WorkerError::from(e).to_string());
            }
        } else if !request.clips_dir.is_dir() {
            logger.log_warning(&format!(
                "clips folder {} does not exist",
                request.clips_dir.display()
            ));
        }
        transition(&mut report, next);

        let planned = plan(&events, config, &request.clips_dir, &self.worker.clip_extension);
        let outcomes = self
            .process_all(&planned, &events, request, config, workflow)
            .await;

        let report = outcomes.into_iter().fold(report, fold_outcome);
        logger.log_completion(&format!(
            "{}/{} succeeded, {} sidecars, {} missing",
            report.succeeded, report.attempted, report.sidecars_written, report.missing_clips
        ));
        report.finish(RunState::Completed)
    }

    /// Validate configuration and read events. Every error here is fatal.
    fn load_inputs(
        &self,
        request: &RunRequest,
        config: &RunConfig,
        workflow: Workflow,
    ) -> WorkerResult<Vec<Event>> {
        config.validate()?;

        if workflow == Workflow::Split {
            match &request.video {
                Some(video) if video.is_file() => {}
                Some(video) => return Err(WorkerError::SourceNotFound(video.clone())),
                None => return Err(WorkerError::config_error("splitting requires a source video")),
            }
        }

        let events = match &request.events {
            EventSource::Table(path) => read_events(path)?,
            EventSource::Events(events) => events.clone(),
        };
        if events.is_empty() {
            return Err(WorkerError::NoEvents);
        }
        config.check_clip_numbers(events.len())?;
        Ok(events)
    }

    /// Run every planned item with at most `max_parallel` in flight.
    ///
    /// Outcomes come back in plan order.
    async fn process_all(
        &self,
        planned: &[WorkerResult<ClipPlan>],
        events: &[Event],
        request: &RunRequest,
        config: &RunConfig,
        workflow: Workflow,
    ) -> Vec<ClipOutcome> {
        let ctx = ClipContext {
            transcoder: self.transcoder.as_ref(),
            source: request.video.as_deref(),
            mode: ExtractMode::from_reencode(config.reencode),
            create_metadata: config.create_metadata,
            sidecar_extension: &self.worker.sidecar_extension,
            total: planned.len(),
        };
        let semaphore = Semaphore::new(self.worker.max_parallel.max(1));

        let futures = planned.iter().map(|entry| {
            let ctx = &ctx;
            let semaphore = &semaphore;
            async move {
                let plan = match entry {
                    Ok(plan) => plan,
                    Err(e) => return rejected_outcome(e),
                };

                let Ok(_permit) = semaphore.acquire().await else {
                    return cancelled_outcome(plan.clip_number);
                };
                if self.is_cancelled() {
                    return cancelled_outcome(plan.clip_number);
                }

                let event = &events[plan.index];
                match workflow {
                    Workflow::Split => process_split_clip(ctx, plan, event).await,
                    _ => process_existing_clip(ctx, plan, event).await,
                }
            }
        });

        join_all(futures).await
    }
}

fn transition(report: &mut RunReport, next: RunState) {
    debug_assert!(report.state.can_transition_to(next));
    tracing::debug!(from = %report.state, to = %next, "State transition");
    report.state = next;
}

fn rejected_outcome(error: &WorkerError) -> ClipOutcome {
    metrics::record_clip(outcome::INVALID_RANGE);
    tracing::warn!(error = %error, "Skipping clip with invalid time range");
    let clip_number = match error {
        WorkerError::InvalidTimeRange { clip_number, .. } => *clip_number,
        _ => 0,
    };
    ClipOutcome::failed(clip_number, ClipFailureKind::InvalidTimeRange, error.to_string())
}

fn cancelled_outcome(clip_number: u32) -> ClipOutcome {
    metrics::record_clip(outcome::CANCELLED);
    ClipOutcome::failed(clip_number, ClipFailureKind::Cancelled, "run cancelled")
}

/// Reducer combining per-clip outcomes into the report.
fn fold_outcome(mut report: RunReport, outcome: ClipOutcome) -> RunReport {
    report.attempted += 1;
    match outcome {
        ClipOutcome::Succeeded {
            sidecar_written, ..
        } => {
            report.succeeded += 1;
            if sidecar_written {
                report.sidecars_written += 1;
            }
        }
        ClipOutcome::Missing { .. } => report.missing_clips += 1,
        ClipOutcome::Failed(failure) => report.failures.push(failure),
    }
    report
}
