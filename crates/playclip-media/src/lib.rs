#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for clip extraction.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeout and cancellation support via tokio
//! - The `Transcoder` boundary used by the pipeline, with an FFmpeg implementation
//! - FFprobe metadata, FFmpeg scene-cut detection and keyframe re-encoding

pub mod clip;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod keyframes;
pub mod probe;
pub mod progress;
pub mod scene_detect;

pub use clip::{ExtractMode, ExtractRequest, FfmpegTranscoder, Transcoder};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use keyframes::{recode_keyframes, DEFAULT_MAX_KEYFRAME_DISTANCE};
pub use probe::{parse_frame_rate, probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use scene_detect::{cuts_to_scenes, FfmpegSceneDetector, SceneSource, DEFAULT_SCENE_THRESHOLD};
