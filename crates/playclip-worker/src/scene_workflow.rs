//! Scene workflow: detect shots, keep the play pattern, label camera angles.

use std::path::{Path, PathBuf};

use tracing::info;

use playclip_media::SceneSource;
use playclip_models::{AngleLabels, Event, TriadCriteria};

use crate::error::WorkerResult;
use crate::scene_filter::{
    assign_angles, filter_min_duration, filter_triads, label_scenes, scenes_to_events, LabeledScene,
    DEFAULT_MIN_SCENE_SECS,
};
use crate::scene_table::{scene_csv_path, write_scene_csv};

/// Tunables of the scene workflow.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    /// Scenes shorter than this are dropped before triad matching (seconds)
    pub min_scene_secs: f64,
    pub criteria: TriadCriteria,
    pub labels: AngleLabels,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            min_scene_secs: DEFAULT_MIN_SCENE_SECS,
            criteria: TriadCriteria::default(),
            labels: AngleLabels::default(),
        }
    }
}

/// What a scene workflow run produced.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub total_scenes: usize,
    pub triads: usize,
    /// Scenes of accepted triads with their angle labels
    pub accepted: Vec<LabeledScene>,
    /// `<stem>_scene.csv`: every detected scene
    pub scene_csv: PathBuf,
    /// `<stem>_filtered_scene.csv`: accepted scenes only
    pub filtered_csv: PathBuf,
}

impl SceneSummary {
    /// Accepted scenes as events for the clip pipeline.
    pub fn to_events(&self) -> Vec<Event> {
        scenes_to_events(&self.accepted)
    }
}

/// Detect, filter and label the scenes of `video`, writing both scene tables beside it.
pub async fn run_scene_workflow(
    source: &dyn SceneSource,
    video: &Path,
    options: &SceneOptions,
) -> WorkerResult<SceneSummary> {
    let scenes = source.scenes(video).await?;
    info!(video = %video.display(), scenes = scenes.len(), "Scenes detected");

    let scene_csv = scene_csv_path(video, "_scene");
    write_scene_csv(&scene_csv, &label_scenes(&scenes, &options.labels))?;

    let kept = filter_min_duration(&scenes, options.min_scene_secs);
    let triads = filter_triads(&kept, &options.criteria);
    let accepted = assign_angles(&triads, &options.labels);

    let filtered_csv = scene_csv_path(video, "_filtered_scene");
    write_scene_csv(&filtered_csv, &accepted)?;

    info!(
        kept = kept.len(),
        triads = triads.len(),
        accepted = accepted.len(),
        "Scene pattern filter finished"
    );

    Ok(SceneSummary {
        total_scenes: scenes.len(),
        triads: triads.len(),
        accepted,
        scene_csv,
        filtered_csv,
    })
}
