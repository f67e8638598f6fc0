//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path (`-` for null outputs)
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Command that decodes the input and discards the result (`-f null -`).
    pub fn null_output(input: impl AsRef<Path>) -> Self {
        Self::new(input, "-").output_args(["-f", "null"])
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Output path this command writes to.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking, timeout and cancellation.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Whether cancellation has already been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_rx
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        self.execute(cmd, progress_callback, false).await.map(|_| ())
    }

    /// Run an FFmpeg command and return every non-progress stderr line.
    ///
    /// Used for filters that report through the log, such as `showinfo`.
    pub async fn run_capture_stderr(&self, cmd: &FfmpegCommand) -> MediaResult<Vec<String>> {
        self.execute(cmd, |_| {}, true).await
    }

    async fn execute<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
        capture: bool,
    ) -> MediaResult<Vec<String>>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        if self.is_cancelled() {
            return Err(MediaError::Cancelled);
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        // Parse progress and keep either every log line or only the tail
        let reader_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut lines: VecDeque<String> = VecDeque::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_line(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                        progress_callback(progress);
                    }
                    continue;
                }
                lines.push_back(line);
                if !capture && lines.len() > STDERR_TAIL_LINES {
                    lines.pop_front();
                }
            }

            Vec::from(lines)
        });

        let result = self.wait_for_completion(&mut child).await;
        let lines = reader_handle.await.unwrap_or_default();

        match result {
            Ok(()) => Ok(lines),
            Err(MediaError::FfmpegFailed {
                message, exit_code, ..
            }) => Err(MediaError::ffmpeg_failed(
                message,
                Some(lines.join("\n")),
                exit_code,
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<()> {
        let timeout_secs = self.timeout_secs;
        let timeout = async move {
            match timeout_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        let cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            match cancel_rx {
                Some(mut rx) => loop {
                    if *rx.borrow_and_update() {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        // Sender gone: cancellation can no longer be requested
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(MediaError::ffmpeg_failed(
                        "FFmpeg exited with non-zero status",
                        None,
                        status.code(),
                    ))
                }
            }
            _ = timeout => {
                let secs = timeout_secs.unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
            _ = cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
        }
    }
}

/// Whether a stderr line is a `key=value` pair from `-progress` output.
fn is_progress_line(line: &str) -> bool {
    match line.trim().split_once('=') {
        Some((key, value)) => {
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                && !value.contains(' ')
        }
        None => false,
    }
}

/// Parse a progress line from FFmpeg's -progress output.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // FFmpeg reports microseconds under both keys
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "out_time" => {
                current.out_time = value.to_string();
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    current.fps = fps;
                }
            }
            "speed" => {
                // Format: "1.5x" or "N/A"
                if let Some(speed_str) = value.strip_suffix('x') {
                    if let Ok(speed) = speed_str.trim().parse() {
                        current.speed = speed;
                    }
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(10.0)
            .duration(30.0)
            .video_codec("libx264")
            .crf(18);

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-ss".to_string()));
        assert!(args.contains(&"10.000".to_string()));
        assert!(args.contains(&"30.000".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");

        // Seek and duration precede the input for fast seeking
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input);
    }

    #[test]
    fn test_null_output() {
        let args = FfmpegCommand::null_output("in.mp4").build_args();
        let n = args.len();
        assert_eq!(&args[n - 3..], &["-f", "null", "-"]);
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        parse_progress_line("out_time_us=5000000", &mut progress);
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        assert!(parse_progress_line("frame=12", &mut progress).is_none());
        let result = parse_progress_line("progress=end", &mut progress);
        assert!(result.is_some());
        assert!(progress.is_complete);
    }

    #[test]
    fn test_is_progress_line() {
        assert!(is_progress_line("out_time_us=5000000"));
        assert!(is_progress_line("stream_0_0_q=28.0"));
        assert!(!is_progress_line(
            "[Parsed_showinfo_1 @ 0x55] n:   0 pts:  12012 pts_time:0.2002 pos: 1"
        ));
        assert!(!is_progress_line("Error opening input file in.mp4."));
    }

    #[test]
    fn test_runner_cancel_state() {
        let (tx, rx) = watch::channel(false);
        let runner = FfmpegRunner::new().with_cancel(rx).with_timeout(5);
        assert!(!runner.is_cancelled());
        tx.send(true).unwrap();
        assert!(runner.is_cancelled());
    }

    #[cfg(unix)]
    fn slow_child() -> Child {
        Command::new("sleep")
            .arg("5")
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_child_times_out() {
        let runner = FfmpegRunner::new().with_timeout(1);
        let mut child = slow_child();

        let started = std::time::Instant::now();
        let result = runner.wait_for_completion(&mut child).await;

        assert!(matches!(result, Err(MediaError::Timeout(1))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_child() {
        let (tx, rx) = watch::channel(false);
        let runner = FfmpegRunner::new().with_cancel(rx).with_timeout(30);
        let mut child = slow_child();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            tx.send(true).ok();
        });
        let result = runner.wait_for_completion(&mut child).await;

        assert!(matches!(result, Err(MediaError::Cancelled)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_is_reported() {
        let runner = FfmpegRunner::new().with_timeout(5);

        let mut ok = Command::new("true").spawn().unwrap();
        assert!(runner.wait_for_completion(&mut ok).await.is_ok());

        let mut failed = Command::new("false").spawn().unwrap();
        assert!(matches!(
            runner.wait_for_completion(&mut failed).await,
            Err(MediaError::FfmpegFailed { exit_code: Some(1), .. })
        ));
    }
}
