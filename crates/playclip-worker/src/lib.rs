//! Clip splitting and metadata sidecar pipeline.
//!
//! This crate provides:
//! - Event table reading with case-insensitive timing columns
//! - Clip planning and the split / sidecars-only orchestrator
//! - Scene triad filtering and camera-angle labeling
//! - Metadata sidecar documents
//! - Scene table and import table export
//! - A menu-driven terminal setup

pub mod clip_pipeline;
pub mod config;
pub mod error;
pub mod event_table;
pub mod import_table;
pub mod interactive;
pub mod logging;
pub mod metrics;
pub mod scene_filter;
pub mod scene_table;
pub mod scene_workflow;
pub mod sidecar;
pub mod timing;

pub use clip_pipeline::{default_clips_dir, select_workflow, ClipOutcome, EventSource, Pipeline, RunRequest};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use event_table::read_events;
pub use logging::RunLogger;
pub use scene_filter::{assign_angles, filter_triads, LabeledScene};
pub use scene_workflow::{run_scene_workflow, SceneOptions, SceneSummary};
pub use sidecar::{build_sidecar, write_sidecar, ClipIdentity, SidecarDocument};
pub use timing::normalize;
