//! Event time base to clip seconds.

use playclip_models::{Event, RunConfig};

/// `(start_seconds, duration_seconds)` for an event under `config`.
///
/// No clamping: a negative start from an aggressive `time_offset` is
/// rejected later by the planner.
pub fn normalize(event: &Event, config: &RunConfig) -> (f64, f64) {
    let start = event.position_ms as f64 / 1000.0 + config.time_offset;
    let duration = event.duration_ms as f64 / 1000.0 + config.buffer;
    (start, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playclip_models::EventFields;

    #[test]
    fn test_buffer_added_to_duration() {
        let event = Event::new(1000, 2000, EventFields::new());
        let (start, duration) = normalize(&event, &RunConfig::default());
        assert!((start - 1.0).abs() < 1e-9);
        assert!((duration - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_offset_not_clamped() {
        let event = Event::new(500, 1000, EventFields::new());
        let config = RunConfig {
            time_offset: -2.0,
            buffer: 0.0,
            ..Default::default()
        };
        let (start, duration) = normalize(&event, &config);
        assert!((start + 1.5).abs() < 1e-9);
        assert!((duration - 1.0).abs() < 1e-9);
    }
}
