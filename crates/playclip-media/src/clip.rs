//! Clip extraction through an external transcoder.
//!
//! The pipeline only talks to the [`Transcoder`] trait. [`FfmpegTranscoder`]
//! is the production implementation; tests substitute their own.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use playclip_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{discard_failed_output, is_nonempty_file};

/// How a clip is cut out of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Copy the compressed stream. Cuts snap to keyframes.
    StreamCopy,
    /// Re-encode for frame-exact cuts. Audio is passed through.
    Reencode,
}

impl ExtractMode {
    pub fn from_reencode(reencode: bool) -> Self {
        if reencode {
            ExtractMode::Reencode
        } else {
            ExtractMode::StreamCopy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractMode::StreamCopy => "stream_copy",
            ExtractMode::Reencode => "reencode",
        }
    }
}

/// One extraction: `[start_seconds, start_seconds + duration_seconds)` of `source` into `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub source: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub output: PathBuf,
    pub mode: ExtractMode,
}

impl ExtractRequest {
    pub fn new(
        source: impl AsRef<Path>,
        start_seconds: f64,
        duration_seconds: f64,
        output: impl AsRef<Path>,
        mode: ExtractMode,
    ) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            start_seconds,
            duration_seconds,
            output: output.as_ref().to_path_buf(),
            mode,
        }
    }

    /// Reject ranges no transcoder can satisfy.
    pub fn validate(&self) -> MediaResult<()> {
        let valid = self.start_seconds.is_finite()
            && self.start_seconds >= 0.0
            && self.duration_seconds.is_finite()
            && self.duration_seconds > 0.0;
        if valid {
            Ok(())
        } else {
            Err(MediaError::InvalidRange {
                start: self.start_seconds,
                duration: self.duration_seconds,
            })
        }
    }
}

/// Boundary to the external tool that cuts clips.
///
/// Succeeds only when the tool exits cleanly and the output exists and is non-empty.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    async fn extract(&self, request: &ExtractRequest) -> MediaResult<()>;
}

/// [`Transcoder`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    encoding: EncodingConfig,
    timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegTranscoder {
    pub fn new(encoding: EncodingConfig, timeout_secs: u64) -> Self {
        Self {
            encoding,
            timeout_secs,
            cancel_rx: None,
        }
    }

    /// Kill in-flight invocations when the receiver flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// FFmpeg command for a request.
    pub fn build_command(&self, request: &ExtractRequest) -> FfmpegCommand {
        let output_args = match request.mode {
            ExtractMode::StreamCopy => self.encoding.to_copy_args(),
            ExtractMode::Reencode => self.encoding.to_reencode_args(),
        };

        FfmpegCommand::new(&request.source, &request.output)
            .seek(request.start_seconds)
            .duration(request.duration_seconds)
            .output_args(output_args)
    }

    fn runner(&self) -> FfmpegRunner {
        let runner = FfmpegRunner::new().with_timeout(self.timeout_secs);
        match &self.cancel_rx {
            Some(rx) => runner.with_cancel(rx.clone()),
            None => runner,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn extract(&self, request: &ExtractRequest) -> MediaResult<()> {
        request.validate()?;
        if !request.source.is_file() {
            return Err(MediaError::FileNotFound(request.source.clone()));
        }

        info!(
            "Extracting {} -> {} (start: {:.3}s, duration: {:.3}s, mode: {})",
            request.source.display(),
            request.output.display(),
            request.start_seconds,
            request.duration_seconds,
            request.mode.as_str()
        );

        let cmd = self.build_command(request);
        let clip_seconds = request.duration_seconds;
        let result = self
            .runner()
            .run_with_progress(&cmd, move |p| {
                debug!("Clip progress: {:.0}%", p.percent_of(clip_seconds));
            })
            .await;

        let result = match result {
            Ok(()) if is_nonempty_file(&request.output).await => Ok(()),
            Ok(()) => Err(MediaError::MissingOutput(request.output.clone())),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!("Extraction of {} failed: {}", request.output.display(), e);
            discard_failed_output(&request.output).await;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: ExtractMode) -> ExtractRequest {
        ExtractRequest::new("game.mp4", 10.0, 5.5, "game Clips/Play_001.mp4", mode)
    }

    #[test]
    fn test_stream_copy_command() {
        let transcoder = FfmpegTranscoder::new(EncodingConfig::default(), 60);
        let args = transcoder
            .build_command(&request(ExtractMode::StreamCopy))
            .build_args();

        assert!(args.contains(&"copy".to_string()));
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"libx264".to_string()));
        assert!(args.contains(&"10.000".to_string()));
        assert!(args.contains(&"5.500".to_string()));
        assert_eq!(args.last().unwrap(), "game Clips/Play_001.mp4");
    }

    #[test]
    fn test_reencode_command() {
        let transcoder = FfmpegTranscoder::new(EncodingConfig::default(), 60);
        let args = transcoder
            .build_command(&request(ExtractMode::Reencode))
            .build_args();

        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"slow".to_string()));
        assert!(args.contains(&"18".to_string()));
        // Audio passes through untouched
        let ca = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[ca + 1], "copy");
    }

    #[test]
    fn test_request_validation() {
        assert!(request(ExtractMode::StreamCopy).validate().is_ok());

        let mut bad = request(ExtractMode::StreamCopy);
        bad.duration_seconds = 0.0;
        assert!(matches!(bad.validate(), Err(MediaError::InvalidRange { .. })));

        bad.duration_seconds = 1.0;
        bad.start_seconds = -0.5;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(ExtractMode::from_reencode(true), ExtractMode::Reencode);
        assert_eq!(ExtractMode::from_reencode(false), ExtractMode::StreamCopy);
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let transcoder = FfmpegTranscoder::new(EncodingConfig::default(), 60);
        let req = ExtractRequest::new(
            "/nonexistent/game.mp4",
            0.0,
            1.0,
            "/nonexistent/out.mp4",
            ExtractMode::StreamCopy,
        );
        assert!(matches!(
            transcoder.extract(&req).await,
            Err(MediaError::FileNotFound(_))
        ));
    }
}
