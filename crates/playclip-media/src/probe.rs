//! FFprobe stream information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Frame rate assumed when the container reports none.
pub const FALLBACK_FPS: f64 = 30.0;

/// Video file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    pub codec: String,
}

impl VideoInfo {
    /// Total frame count implied by duration and frame rate.
    pub fn frame_count(&self) -> u64 {
        (self.duration * self.fps).round().max(0.0) as u64
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a video file for duration, geometry and frame rate.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed on {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_json(&output.stdout)
}

fn parse_probe_json(json: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    // avg_frame_rate is "0/0" for some streams; fall through to r_frame_rate
    let fps = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|r| parse_frame_rate(r))
        .unwrap_or(FALLBACK_FPS);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97"). Zero or invalid rates yield `None`.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den <= 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("abc").is_none());
    }

    #[test]
    fn test_parse_probe_json() {
        let json = br#"{
            "format": {"duration": "12.5"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                 "avg_frame_rate": "0/0", "r_frame_rate": "60/1"}
            ]
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.codec, "h264");
        assert_eq!(info.width, 1920);
        assert!((info.fps - 60.0).abs() < 0.01);
        assert_eq!(info.frame_count(), 750);
    }

    #[test]
    fn test_parse_probe_json_without_video() {
        let json = br#"{"format": {"duration": "3.0"}, "streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(
            parse_probe_json(json),
            Err(MediaError::InvalidVideo(_))
        ));
    }
}
