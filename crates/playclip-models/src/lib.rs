//! Shared data models for the playclip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Timed events read from an event table
//! - Clip plans and output naming
//! - Detected scenes, triads and camera-angle labels
//! - Run and encoding configuration
//! - Run reports

pub mod clip;
pub mod config;
pub mod encoding;
pub mod event;
pub mod report;
pub mod scene;

// Re-export common types
pub use clip::{clip_file_name, clips_folder_name, ClipPlan, CLIP_NAME_PREFIX};
pub use config::{ConfigError, RunConfig};
pub use encoding::EncodingConfig;
pub use event::{Event, EventFields, FieldError, DURATION_COLUMN, NAME_COLUMN, POSITION_COLUMN};
pub use report::{ClipFailure, ClipFailureKind, RunReport, RunState, Workflow};
pub use scene::{AngleLabels, Scene, SceneTriad, TriadCriteria};
