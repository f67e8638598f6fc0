//! Keyframe-dense re-encode of a source video.
//!
//! Stream-copy cuts snap to keyframes. Re-encoding the source once with a
//! keyframe at least every N frames bounds that error to N frames for every
//! later cut.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{discard_failed_output, is_nonempty_file};

/// Default maximum distance between keyframes, in frames.
pub const DEFAULT_MAX_KEYFRAME_DISTANCE: u32 = 15;

/// `<dir>/<stem>_kf<N>.mp4` beside `input`.
pub fn keyframe_output_path(input: &Path, max_keyframe_distance: u32) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{}_kf{}.mp4", stem, max_keyframe_distance))
}

/// Build the re-encode command.
pub fn keyframe_command(
    input: &Path,
    output: &Path,
    max_keyframe_distance: u32,
    force_30fps: bool,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(input, output)
        .video_codec("libx264")
        .preset("medium")
        .crf(18)
        .output_arg("-x264opts")
        .output_arg(format!(
            "keyint={}:min-keyint=1:no-scenecut",
            max_keyframe_distance
        ))
        .audio_codec("copy");

    if force_30fps {
        cmd.output_args(["-r", "30"])
    } else {
        cmd
    }
}

/// Re-encode `input` so every frame is within `max_keyframe_distance` of a keyframe.
///
/// Returns the path of the new file.
pub async fn recode_keyframes(
    input: impl AsRef<Path>,
    max_keyframe_distance: u32,
    force_30fps: bool,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();
    if !input.is_file() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    if max_keyframe_distance == 0 {
        return Err(MediaError::internal("max keyframe distance must be at least 1"));
    }

    let output = keyframe_output_path(input, max_keyframe_distance);
    info!(
        input = %input.display(),
        output = %output.display(),
        max_keyframe_distance,
        force_30fps,
        "Re-encoding for keyframe density"
    );

    let cmd = keyframe_command(input, &output, max_keyframe_distance, force_30fps);
    if let Err(e) = runner.run(&cmd).await {
        discard_failed_output(&output).await;
        return Err(e);
    }
    if !is_nonempty_file(&output).await {
        return Err(MediaError::MissingOutput(output));
    }

    Ok(output)
}
