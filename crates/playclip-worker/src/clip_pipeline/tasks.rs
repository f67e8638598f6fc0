use std::path::Path;

use playclip_models::{clip_file_name, ClipPlan, ConfigError, Event, RunConfig};

use crate::error::{WorkerError, WorkerResult};
use crate::timing::normalize;

/// Plan one clip per event, in input order.
///
/// Events at 1-based position below `config.skip` are left out. Surviving
/// events keep `clip_number = index + start_number`, so skipping never
/// renumbers. Entries with a negative start or non-positive duration come
/// back as `InvalidTimeRange` errors in their position.
pub fn plan(
    events: &[Event],
    config: &RunConfig,
    clips_dir: &Path,
    clip_extension: &str,
) -> Vec<WorkerResult<ClipPlan>> {
    events
        .iter()
        .enumerate()
        .filter(|(index, _)| !is_skipped(*index, config.skip))
        .map(|(index, event)| plan_one(index, event, config, clips_dir, clip_extension))
        .collect()
}

/// Whether the event at zero-based `index` falls under the skip threshold.
pub fn is_skipped(index: usize, skip: u32) -> bool {
    index + 1 < skip as usize
}

/// Clip number for a zero-based event index, `None` past `u32::MAX`.
pub fn clip_number(index: usize, start_number: u32) -> Option<u32> {
    u32::try_from(index).ok()?.checked_add(start_number)
}

fn plan_one(
    index: usize,
    event: &Event,
    config: &RunConfig,
    clips_dir: &Path,
    clip_extension: &str,
) -> WorkerResult<ClipPlan> {
    let clip_number = clip_number(index, config.start_number).ok_or(
        ConfigError::ClipNumberOverflow {
            start_number: config.start_number,
            events: index + 1,
        },
    )?;
    let (start, duration) = normalize(event, config);

    if !(start >= 0.0) || !(duration > 0.0) {
        return Err(WorkerError::InvalidTimeRange {
            clip_number,
            start,
            duration,
        });
    }

    Ok(ClipPlan {
        index,
        clip_number,
        start_seconds: start,
        duration_seconds: duration,
        output_path: clips_dir.join(clip_file_name(clip_number, clip_extension)),
    })
}
