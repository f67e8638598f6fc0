//! Scene boundary filter.
//!
//! Finds the broadcast pattern of one play in a detected scene list: a short
//! intro shot followed by two camera angles of comparable length. Windows
//! are evaluated at every offset and may overlap, so an ambiguous run of
//! scenes can contribute the same scene to more than one triad.

use playclip_models::{AngleLabels, Event, EventFields, Scene, SceneTriad, TriadCriteria, NAME_COLUMN};

/// Default minimum scene length kept before triad matching (seconds).
pub const DEFAULT_MIN_SCENE_SECS: f64 = 0.5;

/// Field holding the camera-angle label on scene-derived events.
pub const ANGLE_COLUMN: &str = "Angle";

/// A scene with its camera-angle label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledScene {
    pub scene: Scene,
    pub angle: String,
    /// 1-based play number, advancing once per full label cycle
    pub play: usize,
}

impl LabeledScene {
    pub fn play_name(&self) -> String {
        format!("Play {}", self.play)
    }
}

/// Drop scenes shorter than `min_secs`.
pub fn filter_min_duration(scenes: &[Scene], min_secs: f64) -> Vec<Scene> {
    scenes
        .iter()
        .filter(|s| s.duration_seconds() >= min_secs)
        .copied()
        .collect()
}

/// Every window of three consecutive scenes matching `criteria`, in order.
pub fn filter_triads(scenes: &[Scene], criteria: &TriadCriteria) -> Vec<SceneTriad> {
    scenes
        .windows(3)
        .enumerate()
        .filter(|(_, w)| {
            criteria.accepts(
                w[0].duration_seconds(),
                w[1].duration_seconds(),
                w[2].duration_seconds(),
            )
        })
        .map(|(offset, w)| SceneTriad {
            offset,
            intro: w[0],
            first_angle: w[1],
            second_angle: w[2],
        })
        .collect()
}

/// Label the scenes of accepted triads round-robin in flat acceptance order.
///
/// Labels index the flattened scene sequence, not the triads, so a
/// two-label list alternates across triad boundaries.
pub fn assign_angles(triads: &[SceneTriad], labels: &AngleLabels) -> Vec<LabeledScene> {
    let flat: Vec<Scene> = triads.iter().flat_map(|t| t.scenes()).collect();
    label_scenes(&flat, labels)
}

/// Label an arbitrary scene sequence round-robin.
pub fn label_scenes(scenes: &[Scene], labels: &AngleLabels) -> Vec<LabeledScene> {
    let cycle = labels.len().max(1);
    scenes
        .iter()
        .enumerate()
        .map(|(i, scene)| LabeledScene {
            scene: *scene,
            angle: labels.label_for(i).to_string(),
            play: i / cycle + 1,
        })
        .collect()
}

/// Convert labeled scenes into events for the clip pipeline.
///
/// Each event carries `Name` (`Play N`) and `Angle` fields; position and
/// duration come from the scene boundaries in milliseconds.
pub fn scenes_to_events(labeled: &[LabeledScene]) -> Vec<Event> {
    labeled
        .iter()
        .map(|l| {
            let mut fields = EventFields::new();
            fields.insert(NAME_COLUMN, l.play_name());
            fields.insert(ANGLE_COLUMN, l.angle.clone());
            Event::new(
                seconds_to_ms(l.scene.start_seconds()),
                seconds_to_ms(l.scene.duration_seconds()),
                fields,
            )
        })
        .collect()
}

fn seconds_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contiguous scenes at 10 fps with the given durations.
    fn scenes(durations: &[f64]) -> Vec<Scene> {
        let mut start = 0u64;
        durations
            .iter()
            .map(|d| {
                let end = start + (d * 10.0).round() as u64;
                let scene = Scene::new(start, end, 10.0).unwrap();
                start = end;
                scene
            })
            .collect()
    }

    #[test]
    fn test_single_triad_accepted() {
        let triads = filter_triads(&scenes(&[2.0, 10.0, 10.2]), &TriadCriteria::default());
        assert_eq!(triads.len(), 1);
        assert_eq!(triads[0].offset, 0);

        let rejected = filter_triads(&scenes(&[3.0, 10.0, 10.2]), &TriadCriteria::default());
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_windows_slide_over_every_offset() {
        // Two plays back to back with a junk scene between them
        let list = scenes(&[1.0, 8.0, 8.5, 20.0, 1.5, 6.0, 6.2]);
        let triads = filter_triads(&list, &TriadCriteria::default());
        let offsets: Vec<usize> = triads.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 4]);
    }

    #[test]
    fn test_overlapping_windows_are_kept() {
        // Windows at 0 and 1 both match: (1, 2, 2) and (2, 2, 2)
        let list = scenes(&[1.0, 2.0, 2.0, 2.0]);
        let triads = filter_triads(&list, &TriadCriteria::default());
        assert_eq!(triads.len(), 2);
        assert_eq!(triads[0].second_angle, triads[1].first_angle);
    }

    #[test]
    fn test_criteria_configurable() {
        let strict = TriadCriteria {
            short_max_secs: 1.5,
            tolerance: 0.01,
        };
        assert!(filter_triads(&scenes(&[2.0, 10.0, 10.2]), &strict).is_empty());
    }

    #[test]
    fn test_assign_angles_round_robin() {
        let list = scenes(&[1.0, 8.0, 8.5, 20.0, 1.5, 6.0, 6.2]);
        let triads = filter_triads(&list, &TriadCriteria::default());

        let labeled = assign_angles(&triads, &AngleLabels::three_angles());
        let angles: Vec<&str> = labeled.iter().map(|l| l.angle.as_str()).collect();
        assert_eq!(
            angles,
            vec!["Score Board", "All 22", "Endzone", "Score Board", "All 22", "Endzone"]
        );
        let plays: Vec<usize> = labeled.iter().map(|l| l.play).collect();
        assert_eq!(plays, vec![1, 1, 1, 2, 2, 2]);

        // Two labels cycle across triad boundaries
        let labeled = assign_angles(&triads, &AngleLabels::two_angles());
        assert_eq!(labeled[2].angle, "All 22");
        assert_eq!(labeled[3].angle, "Endzone");
    }

    #[test]
    fn test_filter_min_duration() {
        let list = scenes(&[0.3, 2.0, 0.5, 4.0]);
        let kept = filter_min_duration(&list, DEFAULT_MIN_SCENE_SECS);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_scenes_to_events() {
        let list = scenes(&[2.0, 10.0, 10.2]);
        let labeled = label_scenes(&list, &AngleLabels::three_angles());
        let events = scenes_to_events(&labeled);

        assert_eq!(events.len(), 3);
        assert_eq!(events[1].position_ms, 2000);
        assert_eq!(events[1].duration_ms, 10000);
        assert_eq!(events[1].name(), Some("Play 1"));
        assert_eq!(events[1].fields.get("Angle"), Some("All 22"));
    }
}
