use std::path::Path;

use tracing::{info, warn};

use playclip_media::{ExtractMode, ExtractRequest, Transcoder};
use playclip_models::{ClipFailure, ClipFailureKind, ClipPlan, Event};

use crate::metrics::{self, outcome};
use crate::sidecar::{build_sidecar, write_sidecar, ClipIdentity};

/// Shared, read-only inputs of every clip in a run.
pub(super) struct ClipContext<'a> {
    pub transcoder: &'a dyn Transcoder,
    pub source: Option<&'a Path>,
    pub mode: ExtractMode,
    pub create_metadata: bool,
    pub sidecar_extension: &'a str,
    pub total: usize,
}

/// Result of one planned clip, folded into the run report.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// Every requested side effect succeeded
    Succeeded { clip_number: u32, sidecar_written: bool },
    /// Sidecars-only run: the clip is not on disk
    Missing { clip_number: u32 },
    Failed(ClipFailure),
}

impl ClipOutcome {
    pub(super) fn failed(clip_number: u32, kind: ClipFailureKind, message: impl Into<String>) -> Self {
        ClipOutcome::Failed(ClipFailure {
            clip_number,
            kind,
            message: message.into(),
        })
    }
}

/// Write the sidecar for a planned clip.
async fn write_clip_sidecar(ctx: &ClipContext<'_>, plan: &ClipPlan, event: &Event) -> Result<(), ClipOutcome> {
    let path = plan.sidecar_path(ctx.sidecar_extension);
    let document = build_sidecar(&ClipIdentity::from_plan(plan), &event.fields, event.duration_ms);

    match write_sidecar(&path, &document).await {
        Ok(()) => {
            metrics::record_sidecar(outcome::SUCCESS);
            Ok(())
        }
        Err(e) => {
            metrics::record_sidecar(outcome::FAILED);
            warn!(clip_number = plan.clip_number, error = %e, "Sidecar write failed");
            Err(ClipOutcome::failed(
                plan.clip_number,
                ClipFailureKind::SidecarWrite,
                e.to_string(),
            ))
        }
    }
}

/// Cut one clip, then write its sidecar when requested.
///
/// A failed transcode skips the sidecar so no sidecar points at a missing clip.
pub(super) async fn process_split_clip(
    ctx: &ClipContext<'_>,
    plan: &ClipPlan,
    event: &Event,
) -> ClipOutcome {
    let Some(source) = ctx.source else {
        return ClipOutcome::failed(
            plan.clip_number,
            ClipFailureKind::Transcode,
            "no source video",
        );
    };

    info!(
        clip_number = plan.clip_number,
        clip_index = plan.index + 1,
        total_clips = ctx.total,
        start = plan.start_seconds,
        duration = plan.duration_seconds,
        transcoder = ctx.transcoder.name(),
        "Starting clip"
    );

    let request = ExtractRequest::new(
        source,
        plan.start_seconds,
        plan.duration_seconds,
        &plan.output_path,
        ctx.mode,
    );

    if let Err(e) = ctx.transcoder.extract(&request).await {
        let kind = if e.is_cancelled() {
            metrics::record_clip(outcome::CANCELLED);
            ClipFailureKind::Cancelled
        } else {
            metrics::record_clip(outcome::FAILED);
            ClipFailureKind::Transcode
        };
        warn!(clip_number = plan.clip_number, error = %e, "Clip extraction failed");
        return ClipOutcome::failed(plan.clip_number, kind, e.to_string());
    }

    let sidecar_written = if ctx.create_metadata {
        if let Err(failed) = write_clip_sidecar(ctx, plan, event).await {
            metrics::record_clip(outcome::FAILED);
            return failed;
        }
        true
    } else {
        false
    };

    metrics::record_clip(outcome::SUCCESS);
    info!(clip_number = plan.clip_number, file = %plan.file_name(), "Clip completed");
    ClipOutcome::Succeeded {
        clip_number: plan.clip_number,
        sidecar_written,
    }
}

/// Write the sidecar for a clip that already exists on disk.
pub(super) async fn process_existing_clip(
    ctx: &ClipContext<'_>,
    plan: &ClipPlan,
    event: &Event,
) -> ClipOutcome {
    if !plan.output_path.is_file() {
        metrics::record_clip(outcome::MISSING_CLIP);
        warn!(
            clip_number = plan.clip_number,
            path = %plan.output_path.display(),
            "Clip not found, skipping sidecar"
        );
        return ClipOutcome::Missing {
            clip_number: plan.clip_number,
        };
    }

    match write_clip_sidecar(ctx, plan, event).await {
        Ok(()) => {
            metrics::record_clip(outcome::SUCCESS);
            ClipOutcome::Succeeded {
                clip_number: plan.clip_number,
                sidecar_written: true,
            }
        }
        Err(failed) => {
            metrics::record_clip(outcome::FAILED);
            failed
        }
    }
}
