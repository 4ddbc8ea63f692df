use std::time::Duration;

/// Why a detection pass should run for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUpdate {
    /// First presented frame of a source.
    MetadataLoaded,
    /// Media time advanced by at least one interval.
    Periodic,
}

/// Turns presented-frame timestamps into time update events.
///
/// Runs on media time, so pausing stops updates and a slow decoder yields
/// fewer of them.
#[derive(Clone, Debug)]
pub struct TimeUpdateClock {
    interval: f64,
    last_fired: Option<f64>,
}

impl TimeUpdateClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f64(),
            last_fired: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.as_secs_f64();
    }

    /// Forgets the current source; the next frame counts as its first.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    /// Feeds the timestamp (seconds) of a frame that was just presented.
    ///
    /// A timestamp earlier than the last event means playback restarted and
    /// fires immediately.
    pub fn on_frame(&mut self, timestamp: f64) -> Option<TimeUpdate> {
        let event = match self.last_fired {
            None => TimeUpdate::MetadataLoaded,
            Some(last) if timestamp < last => TimeUpdate::Periodic,
            Some(last) if timestamp - last >= self.interval => TimeUpdate::Periodic,
            Some(_) => return None,
        };
        self.last_fired = Some(timestamp);
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn clock_ms(ms: u64) -> TimeUpdateClock {
        TimeUpdateClock::new(Duration::from_millis(ms))
    }

    /// Feeds frames at `fps` for `secs` and returns the timestamps that fired.
    fn fired(clock: &mut TimeUpdateClock, fps: f64, secs: f64) -> Vec<(f64, TimeUpdate)> {
        let frames = (fps * secs).round() as usize;
        (0..frames)
            .filter_map(|i| {
                let t = i as f64 / fps;
                clock.on_frame(t).map(|e| (t, e))
            })
            .collect()
    }

    #[test]
    fn test_first_frame_is_metadata_loaded() {
        let mut clock = clock_ms(250);
        assert_eq!(clock.on_frame(0.0), Some(TimeUpdate::MetadataLoaded));
    }

    #[test]
    fn test_first_frame_need_not_be_zero() {
        let mut clock = clock_ms(250);
        assert_eq!(clock.on_frame(3.2), Some(TimeUpdate::MetadataLoaded));
        assert_eq!(clock.on_frame(3.3), None);
    }

    #[rstest]
    #[case::default_cadence(250, 9)]
    #[case::half_second(500, 5)]
    #[case::one_per_second(1000, 3)]
    fn test_fires_at_cadence(#[case] interval_ms: u64, #[case] expected: usize) {
        let mut clock = clock_ms(interval_ms);
        // frames 0.0 ..= 2.0 s of 40 fps video: one load event plus periodic ones
        let events = fired(&mut clock, 40.0, 2.0 + 1.0 / 40.0);
        assert_eq!(events.len(), expected);
        assert_eq!(events[0].1, TimeUpdate::MetadataLoaded);
        assert!(events[1..].iter().all(|(_, e)| *e == TimeUpdate::Periodic));
    }

    #[test]
    fn test_no_event_between_intervals() {
        let mut clock = clock_ms(250);
        clock.on_frame(0.0);
        assert_eq!(clock.on_frame(0.1), None);
        assert_eq!(clock.on_frame(0.2), None);
        assert_eq!(clock.on_frame(0.25), Some(TimeUpdate::Periodic));
    }

    #[test]
    fn test_backwards_timestamp_fires() {
        let mut clock = clock_ms(250);
        clock.on_frame(0.0);
        clock.on_frame(5.0);
        assert_eq!(clock.on_frame(0.0), Some(TimeUpdate::Periodic));
        assert_eq!(clock.on_frame(0.1), None);
    }

    #[test]
    fn test_reset_restarts_with_metadata_loaded() {
        let mut clock = clock_ms(250);
        clock.on_frame(0.0);
        clock.reset();
        assert_eq!(clock.on_frame(0.04), Some(TimeUpdate::MetadataLoaded));
    }

    #[test]
    fn test_set_interval_applies_to_next_frame() {
        let mut clock = clock_ms(1000);
        clock.on_frame(0.0);
        assert_eq!(clock.on_frame(0.3), None);
        clock.set_interval(Duration::from_millis(250));
        assert_eq!(clock.on_frame(0.31), Some(TimeUpdate::Periodic));
    }
}
