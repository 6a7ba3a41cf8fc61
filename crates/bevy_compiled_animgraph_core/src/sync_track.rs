//! Sync tracks describe a clip's logical timeline as a sequence of named sync events over
//! normalized time. Nodes with different durations can be locked together by exchanging
//! [`SyncTrackTime`]s instead of seconds.

use std::sync::{Arc, LazyLock};

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};

use crate::ids::StringId;

#[derive(Clone, Debug, Reflect, PartialEq, Serialize, Deserialize)]
pub struct SyncTrackEvent {
    pub id: StringId,
    /// Normalized start time, in [0, 1)
    pub start_time: f32,
    /// Normalized duration, in (0, 1]
    pub duration: f32,
}

/// Position on a sync track: which event, and how far through it.
#[derive(Clone, Copy, Debug, Reflect, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct SyncTrackTime {
    pub event_index: usize,
    pub percentage_through: f32,
}

impl SyncTrackTime {
    pub fn new(event_index: usize, percentage_through: f32) -> Self {
        Self {
            event_index,
            percentage_through,
        }
    }
}

#[derive(Clone, Copy, Debug, Reflect, Default, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct SyncTrackTimeRange {
    pub start_time: SyncTrackTime,
    pub end_time: SyncTrackTime,
}

impl SyncTrackTimeRange {
    pub fn new(start_time: SyncTrackTime, end_time: SyncTrackTime) -> Self {
        Self {
            start_time,
            end_time,
        }
    }
}

static DEFAULT_TRACK: LazyLock<Arc<SyncTrack>> = LazyLock::new(|| Arc::new(SyncTrack::default()));

/// Always holds at least one event. Deserializing an empty event list yields the default track.
#[derive(Clone, Debug, Reflect, PartialEq, Serialize, Deserialize)]
#[reflect(Default)]
#[serde(from = "SyncTrackSerial")]
pub struct SyncTrack {
    events: Vec<SyncTrackEvent>,
}

#[derive(Deserialize)]
struct SyncTrackSerial {
    events: Vec<SyncTrackEvent>,
}

impl From<SyncTrackSerial> for SyncTrack {
    fn from(serial: SyncTrackSerial) -> Self {
        if serial.events.is_empty() {
            Self::default()
        } else {
            Self {
                events: serial.events,
            }
        }
    }
}

impl Default for SyncTrack {
    /// A single event spanning the whole timeline.
    fn default() -> Self {
        Self {
            events: vec![SyncTrackEvent {
                id: StringId::default(),
                start_time: 0.,
                duration: 1.,
            }],
        }
    }
}

impl SyncTrack {
    /// Builds a track from `(id, normalized start time)` markers. Markers are sorted; if the
    /// first one does not start at 0 the last event wraps around the end of the timeline.
    pub fn from_markers(markers: impl IntoIterator<Item = (StringId, f32)>) -> Self {
        let mut markers: Vec<(StringId, f32)> = markers
            .into_iter()
            .map(|(id, start)| (id, start.rem_euclid(1.)))
            .collect();
        markers.sort_by(|a, b| a.1.total_cmp(&b.1));
        markers.dedup_by(|a, b| a.1 == b.1);

        if markers.is_empty() {
            return Self::default();
        }

        let first_start = markers[0].1;
        let count = markers.len();
        let events = markers
            .iter()
            .enumerate()
            .map(|(i, (id, start))| {
                let next_start = if i + 1 < count {
                    markers[i + 1].1
                } else {
                    first_start + 1.
                };
                SyncTrackEvent {
                    id: id.clone(),
                    start_time: *start,
                    duration: next_start - start,
                }
            })
            .collect();

        Self { events }
    }

    /// Shared track used by nodes that have no timeline of their own.
    pub fn default_track() -> Arc<SyncTrack> {
        DEFAULT_TRACK.clone()
    }

    pub fn events(&self) -> &[SyncTrackEvent] {
        &self.events
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    /// Normalized [0, 1) position of a sync time on this track.
    pub fn get_percentage_through(&self, time: SyncTrackTime) -> f32 {
        let event = &self.events[time.event_index % self.events.len()];
        let percentage_through = time.percentage_through.clamp(0., 1.);
        let position = event.start_time + event.duration * percentage_through;
        if position >= 1. { position - 1. } else { position }
    }

    /// Sync time at a normalized position on this track.
    pub fn get_time(&self, percentage: f32) -> SyncTrackTime {
        let percentage = percentage.rem_euclid(1.);
        for (index, event) in self.events.iter().enumerate() {
            let offset = (percentage - event.start_time).rem_euclid(1.);
            if offset < event.duration {
                return SyncTrackTime::new(index, offset / event.duration);
            }
        }
        // Rounding at the very end of the last event
        SyncTrackTime::new(self.events.len() - 1, 1.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1.0e-5, "{a} != {b}");
    }

    #[test]
    fn default_track_maps_identity() {
        let track = SyncTrack::default();
        let time = track.get_time(0.25);
        assert_eq!(time.event_index, 0);
        assert_close(time.percentage_through, 0.25);
        assert_close(track.get_percentage_through(time), 0.25);
    }

    #[test]
    fn markers_split_the_timeline() {
        let track = SyncTrack::from_markers([("left".into(), 0.), ("right".into(), 0.5)]);
        let time = track.get_time(0.75);
        assert_eq!(time.event_index, 1);
        assert_close(time.percentage_through, 0.5);
    }

    #[test]
    fn last_event_wraps_when_first_marker_is_late() {
        let track = SyncTrack::from_markers([("a".into(), 0.25), ("b".into(), 0.75)]);
        assert_close(track.events()[1].duration, 0.5);

        // 0.1 lies inside the wrapped part of "b"
        let time = track.get_time(0.1);
        assert_eq!(time.event_index, 1);
        assert_close(time.percentage_through, 0.7);
        assert_close(track.get_percentage_through(time), 0.1);
    }

    #[test]
    fn empty_track_deserializes_to_default() {
        let track: SyncTrack = ron::from_str("(events: [])").unwrap();
        assert_eq!(track, SyncTrack::default());
        assert_close(track.get_percentage_through(SyncTrackTime::default()), 0.);
        assert_eq!(track.get_time(0.5).event_index, 0);
    }

    #[test]
    fn track_ron_roundtrip() {
        let track = SyncTrack::from_markers([("a".into(), 0.), ("b".into(), 0.4)]);
        let serialized = ron::to_string(&track).unwrap();
        assert_eq!(ron::from_str::<SyncTrack>(&serialized).unwrap(), track);
    }
}
