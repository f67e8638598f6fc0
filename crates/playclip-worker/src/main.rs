//! Playclip command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use playclip_media::{
    check_ffmpeg, probe_video, recode_keyframes, FfmpegRunner, FfmpegSceneDetector, FfmpegTranscoder,
    SceneSource, DEFAULT_MAX_KEYFRAME_DISTANCE, DEFAULT_SCENE_THRESHOLD,
};
use playclip_models::{AngleLabels, EncodingConfig, RunConfig, RunReport, RunState};
use playclip_worker::import_table::build_import_table;
use playclip_worker::interactive::prompt_run;
use playclip_worker::scene_table::SceneListFile;
use playclip_worker::{
    run_scene_workflow, EventSource, Pipeline, RunRequest, SceneOptions, WorkerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "playclip")]
#[command(about = "Cut game film into per-play clips with metadata sidecars")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a video into one clip per event
    Split {
        /// Source video
        #[arg(short, long)]
        video: PathBuf,

        /// Event table (CSV)
        #[arg(short, long)]
        events: PathBuf,

        /// Folder that receives "<video stem> Clips" (default: the video's folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crop filter applied when re-encoding, e.g. "crop=1280:720:0:0"
        #[arg(long)]
        crop: Option<String>,

        /// Re-encode quality (lower is better)
        #[arg(long)]
        crf: Option<u8>,

        /// Keep the audio stream on stream-copy cuts
        #[arg(long, default_value_t = false)]
        keep_audio: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Write sidecars for clips that already exist
    Sidecars {
        /// Event table (CSV)
        #[arg(short, long)]
        events: PathBuf,

        /// Folder holding the clips
        #[arg(short, long)]
        clips: PathBuf,

        /// Clip number assigned to the first event
        #[arg(long, default_value_t = 1)]
        start_number: u32,

        /// Leave out events at 1-based position below this value
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },

    /// Detect scenes, keep intro/angle/angle triads and label camera angles
    Scenes {
        /// Source video
        #[arg(short, long)]
        video: PathBuf,

        /// Read scenes from an exported scene list instead of detecting them
        #[arg(long)]
        scene_list: Option<PathBuf>,

        /// Frame rate of the scene list (default: probed from the video)
        #[arg(long, requires = "scene_list")]
        fps: Option<f64>,

        /// Scene change threshold for detection
        #[arg(long, default_value_t = DEFAULT_SCENE_THRESHOLD)]
        threshold: f64,

        /// Label two angles (sideline, end zone) instead of three
        #[arg(long, default_value_t = false)]
        two_angles: bool,

        /// Split the accepted scenes into clips with sidecars
        #[arg(long, default_value_t = false)]
        split: bool,
    },

    /// Re-encode a video with a bounded keyframe distance
    Keyframes {
        /// Source video
        #[arg(short, long)]
        video: PathBuf,

        /// Maximum frames between keyframes
        #[arg(long, default_value_t = DEFAULT_MAX_KEYFRAME_DISTANCE)]
        max_keyframe_distance: u32,

        /// Force a 30 fps output
        #[arg(long, default_value_t = false)]
        force_30fps: bool,
    },

    /// Write import.csv with cumulative clip positions
    ImportTable {
        /// Folder holding the clips
        #[arg(short, long)]
        clips: PathBuf,
    },

    /// Menu driven run on the terminal
    Interactive,
}

/// Per-run settings of the split command.
#[derive(Args, Debug)]
struct RunArgs {
    /// Run configuration as JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    start_number: Option<u32>,

    #[arg(long)]
    skip: Option<u32>,

    /// Re-encode instead of stream copy
    #[arg(long, default_value_t = false)]
    reencode: bool,

    /// Seconds added to every position (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    time_offset: Option<f64>,

    /// Seconds added to every duration
    #[arg(long)]
    buffer: Option<f64>,

    /// Do not write sidecars
    #[arg(long, default_value_t = false)]
    no_metadata: bool,
}

impl RunArgs {
    fn to_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                RunConfig::from_json(&json)?
            }
            None => RunConfig::default(),
        };
        config.split_video = true;
        if let Some(n) = self.start_number {
            config.start_number = n;
        }
        if let Some(n) = self.skip {
            config.skip = n;
        }
        if self.reencode {
            config.reencode = true;
        }
        if let Some(offset) = self.time_offset {
            config.time_offset = offset;
        }
        if let Some(buffer) = self.buffer {
            config.buffer = buffer;
        }
        if self.no_metadata {
            config.create_metadata = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "playclip=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Flips to `true` on Ctrl-C.
fn cancel_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, finishing clips in flight");
            tx.send(true).ok();
        }
    });
    rx
}

fn pipeline(worker: &WorkerConfig, encoding: EncodingConfig, cancel_rx: watch::Receiver<bool>) -> Pipeline {
    let transcoder = FfmpegTranscoder::new(encoding, worker.transcode_timeout.as_secs())
        .with_cancel(cancel_rx.clone());
    Pipeline::new(Arc::new(transcoder), worker.clone()).with_cancel(cancel_rx)
}

/// Runner for long single ffmpeg jobs, bounded like one clip extraction.
fn runner(worker: &WorkerConfig, cancel_rx: watch::Receiver<bool>) -> FfmpegRunner {
    FfmpegRunner::new()
        .with_timeout(worker.transcode_timeout.as_secs())
        .with_cancel(cancel_rx)
}

fn print_report(report: &RunReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    if report.state == RunState::Failed {
        bail!(
            "run failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn scene_list_fps(video: &Path, fps: Option<f64>) -> Result<f64> {
    if let Some(fps) = fps {
        return Ok(fps);
    }
    let info = probe_video(video)
        .await
        .with_context(|| format!("probing frame rate of {}", video.display()))?;
    Ok(info.fps)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let worker = WorkerConfig::from_env();
    info!("Worker config: {:?}", worker);

    let cancel_rx = cancel_channel();

    match cli.command {
        Command::Split {
            video,
            events,
            output,
            crop,
            crf,
            keep_audio,
            run,
        } => {
            check_ffmpeg()?;
            let config = run.to_config()?;
            let mut encoding = EncodingConfig::new().with_copy_audio(keep_audio);
            if let Some(crop) = crop {
                encoding = encoding.with_crop(crop);
            }
            if let Some(crf) = crf {
                encoding = encoding.with_crf(crf);
            }
            let request = RunRequest::split(EventSource::Table(events), video, output.as_deref());
            let report = pipeline(&worker, encoding, cancel_rx)
                .run(&request, &config)
                .await;
            print_report(&report)
        }

        Command::Sidecars {
            events,
            clips,
            start_number,
            skip,
        } => {
            let config = RunConfig {
                start_number,
                skip,
                ..RunConfig::sidecars_only()
            };
            let request = RunRequest::sidecars(EventSource::Table(events), clips);
            let report = pipeline(&worker, EncodingConfig::default(), cancel_rx)
                .run(&request, &config)
                .await;
            print_report(&report)
        }

        Command::Scenes {
            video,
            scene_list,
            fps,
            threshold,
            two_angles,
            split,
        } => {
            let source: Box<dyn SceneSource> = match scene_list {
                Some(path) => Box::new(SceneListFile {
                    path,
                    frame_rate: scene_list_fps(&video, fps).await?,
                }),
                None => {
                    check_ffmpeg()?;
                    Box::new(
                        FfmpegSceneDetector::new(threshold)
                            .with_runner(runner(&worker, cancel_rx.clone())),
                    )
                }
            };
            let options = SceneOptions {
                labels: if two_angles {
                    AngleLabels::two_angles()
                } else {
                    AngleLabels::three_angles()
                },
                ..SceneOptions::default()
            };

            let summary = run_scene_workflow(source.as_ref(), &video, &options).await?;
            info!(
                scenes = summary.total_scenes,
                triads = summary.triads,
                filtered = %summary.filtered_csv.display(),
                "Scene tables written"
            );

            if !split {
                return Ok(());
            }
            if summary.accepted.is_empty() {
                warn!("No scene matched the play pattern, nothing to split");
                return Ok(());
            }
            check_ffmpeg()?;
            let request = RunRequest::split(EventSource::Events(summary.to_events()), video, None);
            let config = RunConfig {
                buffer: 0.0,
                ..RunConfig::default()
            };
            let report = pipeline(&worker, EncodingConfig::default(), cancel_rx)
                .run(&request, &config)
                .await;
            print_report(&report)
        }

        Command::Keyframes {
            video,
            max_keyframe_distance,
            force_30fps,
        } => {
            check_ffmpeg()?;
            let runner = runner(&worker, cancel_rx);
            let output = recode_keyframes(&video, max_keyframe_distance, force_30fps, &runner).await?;
            println!("{}", output.display());
            Ok(())
        }

        Command::ImportTable { clips } => {
            let path = build_import_table(&clips, &worker.clip_extension).await?;
            println!("{}", path.display());
            Ok(())
        }

        Command::Interactive => {
            let setup = tokio::task::spawn_blocking(|| {
                let stdin = std::io::stdin();
                let mut input = stdin.lock();
                let mut output = std::io::stdout();
                prompt_run(&mut input, &mut output)
            })
            .await??;

            if setup.config.split_video {
                check_ffmpeg()?;
            }
            let report = pipeline(&worker, EncodingConfig::default(), cancel_rx)
                .run(&setup.request, &setup.config)
                .await;
            print_report(&report)
        }
    }
}
