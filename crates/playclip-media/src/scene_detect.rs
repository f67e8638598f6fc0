//! Shot-boundary detection.
//!
//! [`SceneSource`] is the boundary the scene workflow consumes: it yields
//! frame ranges at a known frame rate. [`FfmpegSceneDetector`] implements it
//! with FFmpeg's `scene` score and the `showinfo` filter.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use playclip_models::Scene;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_video;

/// Default scene-change score threshold for FFmpeg's `select` filter.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.3;

/// Anything that yields the shots of a video as frame ranges.
#[async_trait]
pub trait SceneSource: Send + Sync {
    async fn scenes(&self, video: &Path) -> MediaResult<Vec<Scene>>;
}

/// Turn cut timestamps into contiguous scenes covering `[0, duration_secs)`.
///
/// Cuts outside the video or collapsing onto the same frame are ignored.
pub fn cuts_to_scenes(cuts_secs: &[f64], fps: f64, duration_secs: f64) -> Vec<Scene> {
    if !(fps.is_finite() && fps > 0.0) {
        return Vec::new();
    }
    let total_frames = (duration_secs * fps).round().max(0.0) as u64;

    let mut boundaries: Vec<u64> = cuts_secs
        .iter()
        .filter(|t| t.is_finite())
        .map(|t| (t * fps).round().max(0.0) as u64)
        .filter(|&f| f > 0 && f < total_frames)
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut scenes = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for end in boundaries.into_iter().chain(std::iter::once(total_frames)) {
        if let Some(scene) = Scene::new(start, end, fps) {
            scenes.push(scene);
        }
        start = end;
    }
    scenes
}

/// Extract `pts_time` from one `showinfo` log line.
fn parse_showinfo_pts(line: &str) -> Option<f64> {
    if !line.contains("Parsed_showinfo") {
        return None;
    }
    let rest = &line[line.find("pts_time:")? + "pts_time:".len()..];
    rest.split_whitespace().next()?.parse().ok()
}

/// [`SceneSource`] running FFmpeg's scene-change score over the whole video.
#[derive(Debug, Clone)]
pub struct FfmpegSceneDetector {
    threshold: f64,
    runner: FfmpegRunner,
}

impl Default for FfmpegSceneDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SCENE_THRESHOLD)
    }
}

impl FfmpegSceneDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            runner: FfmpegRunner::new(),
        }
    }

    /// Run detection through `runner`, inheriting its timeout and cancellation.
    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    fn build_command(&self, video: &Path) -> FfmpegCommand {
        FfmpegCommand::null_output(video)
            .log_level("info")
            .video_filter(format!("select='gt(scene,{})',showinfo", self.threshold))
    }
}

#[async_trait]
impl SceneSource for FfmpegSceneDetector {
    async fn scenes(&self, video: &Path) -> MediaResult<Vec<Scene>> {
        let info = probe_video(video).await?;
        info!(
            video = %video.display(),
            fps = info.fps,
            duration = info.duration,
            threshold = self.threshold,
            "Detecting scenes"
        );

        let lines = self
            .runner
            .run_capture_stderr(&self.build_command(video))
            .await?;
        let cuts: Vec<f64> = lines.iter().filter_map(|l| parse_showinfo_pts(l)).collect();
        debug!("FFmpeg reported {} cut points", cuts.len());

        Ok(cuts_to_scenes(&cuts, info.fps, info.duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuts_to_scenes() {
        let scenes = cuts_to_scenes(&[2.0, 12.0], 30.0, 22.0);
        assert_eq!(scenes.len(), 3);
        assert_eq!((scenes[0].start_frame, scenes[0].end_frame), (0, 60));
        assert_eq!((scenes[1].start_frame, scenes[1].end_frame), (60, 360));
        assert_eq!((scenes[2].start_frame, scenes[2].end_frame), (360, 660));
    }

    #[test]
    fn test_cuts_to_scenes_ignores_duplicates_and_outliers() {
        let scenes = cuts_to_scenes(&[5.0, 1.0, 1.0, -3.0, 99.0, f64::NAN], 10.0, 10.0);
        let frames: Vec<_> = scenes.iter().map(|s| (s.start_frame, s.end_frame)).collect();
        assert_eq!(frames, vec![(0, 10), (10, 50), (50, 100)]);
    }

    #[test]
    fn test_cuts_to_scenes_without_cuts() {
        let scenes = cuts_to_scenes(&[], 25.0, 4.0);
        assert_eq!(scenes.len(), 1);
        assert!((scenes[0].duration_seconds() - 4.0).abs() < 1e-9);
        assert!(cuts_to_scenes(&[1.0], 0.0, 4.0).is_empty());
    }

    #[test]
    fn test_parse_showinfo_pts() {
        let line = "[Parsed_showinfo_1 @ 0x5581] n:   3 pts: 367367 pts_time:12.2456 duration: 1001";
        assert!((parse_showinfo_pts(line).unwrap() - 12.2456).abs() < 1e-9);
        assert!(parse_showinfo_pts("frame=  120 fps= 30 q=-0.0").is_none());
        assert!(parse_showinfo_pts("[Parsed_showinfo_1 @ 0x5581] config in time_base: 1/30000").is_none());
    }

    #[test]
    fn test_detector_command() {
        let args = FfmpegSceneDetector::new(0.4)
            .build_command(Path::new("game.mp4"))
            .build_args();
        assert!(args.contains(&"select='gt(scene,0.4)',showinfo".to_string()));
        assert!(args.contains(&"info".to_string()));
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn test_with_runner_carries_cancellation() {
        let (tx, rx) = tokio::sync::watch::channel(false);
        let detector = FfmpegSceneDetector::new(0.4)
            .with_runner(FfmpegRunner::new().with_cancel(rx).with_timeout(1));
        assert!(!detector.runner.is_cancelled());

        tx.send(true).unwrap();
        assert!(detector.runner.is_cancelled());
    }
}
