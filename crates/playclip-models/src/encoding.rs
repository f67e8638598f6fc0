//! Video encoding configuration for clip extraction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset; slow gives the best quality per bit
pub const DEFAULT_PRESET: &str = "slow";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Audio is passed through untouched when re-encoding
pub const DEFAULT_AUDIO_CODEC: &str = "copy";
/// Keyframe every 15 frames, no scene-cut keyframes
pub const DEFAULT_X264_PARAMS: &str = "keyint=15:scenecut=0";
/// Default container extension for clips
pub const DEFAULT_CLIP_EXTENSION: &str = "mp4";

/// Encoding parameters used when a clip is re-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Extra x264 parameters
    #[serde(default = "default_x264_params")]
    pub x264_params: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Optional crop filter, e.g. `crop=iw:ih-600` to remove broadcast bars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_filter: Option<String>,

    /// Keep the audio stream when stream-copying (dropped by default)
    #[serde(default)]
    pub keep_audio_on_copy: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_x264_params() -> String {
    DEFAULT_X264_PARAMS.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            x264_params: DEFAULT_X264_PARAMS.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            crop_filter: None,
            keep_audio_on_copy: false,
        }
    }
}

impl EncodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config that keeps or drops audio on stream copy.
    pub fn with_copy_audio(mut self, keep: bool) -> Self {
        self.keep_audio_on_copy = keep;
        self
    }

    /// Returns a new config with a crop filter.
    pub fn with_crop(mut self, filter: impl Into<String>) -> Self {
        self.crop_filter = Some(filter.into());
        self
    }

    /// Output arguments for a re-encode extraction.
    pub fn to_reencode_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(crop) = &self.crop_filter {
            args.extend_from_slice(&["-vf".to_string(), crop.clone()]);
        }

        args.extend_from_slice(&[
            "-bsf:v".to_string(),
            "h264_mp4toannexb".to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
        ]);

        if !self.x264_params.is_empty() {
            args.extend_from_slice(&["-x264-params".to_string(), self.x264_params.clone()]);
        }

        args.extend_from_slice(&["-c:a".to_string(), self.audio_codec.clone()]);
        args
    }

    /// Output arguments for a stream-copy extraction.
    pub fn to_copy_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), "copy".to_string()];
        if self.keep_audio_on_copy {
            args.extend_from_slice(&["-c:a".to_string(), "copy".to_string()]);
        } else {
            args.push("-an".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.crf, 18);
        assert_eq!(config.preset, "slow");
    }

    #[test]
    fn test_reencode_args() {
        let args = EncodingConfig::default().to_reencode_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"18".to_string()));
        assert!(args.contains(&"keyint=15:scenecut=0".to_string()));
        assert!(!args.contains(&"-vf".to_string()));

        let cropped = EncodingConfig::default()
            .with_crop("crop=iw:ih-600")
            .to_reencode_args();
        assert_eq!(cropped[0], "-vf");
        assert_eq!(cropped[1], "crop=iw:ih-600");
    }

    #[test]
    fn test_copy_args() {
        let args = EncodingConfig::default().to_copy_args();
        assert_eq!(args, vec!["-c:v", "copy", "-an"]);

        let with_audio = EncodingConfig::new().with_copy_audio(true);
        assert_eq!(with_audio.to_copy_args(), vec!["-c:v", "copy", "-c:a", "copy"]);
    }

    #[test]
    fn test_crf_override() {
        let config = EncodingConfig::new().with_crf(23);
        let args = config.to_reencode_args();
        let crf = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf + 1], "23");
    }
}
