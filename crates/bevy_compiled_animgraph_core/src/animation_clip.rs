use std::sync::Arc;

use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::{
    ids::StringId,
    pose::{BoneTransform, Pose},
    sync_track::SyncTrack,
};

/// Event marker on a clip timeline. Times are normalized.
#[derive(Clone, Debug, Reflect, PartialEq, Serialize, Deserialize)]
pub struct ClipEvent {
    pub id: StringId,
    pub start_time: f32,
    /// Zero for instant events
    #[serde(default)]
    pub duration: f32,
}

impl ClipEvent {
    pub fn instant(id: impl Into<StringId>, start_time: f32) -> Self {
        Self {
            id: id.into(),
            start_time,
            duration: 0.,
        }
    }
}

/// Evenly spaced keyframes for one bone across the whole clip.
#[derive(Clone, Debug, Reflect, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    pub keyframes: Vec<BoneTransform>,
}

impl BoneTrack {
    fn sample(&self, percentage: f32) -> BoneTransform {
        match self.keyframes.len() {
            0 => BoneTransform::IDENTITY,
            1 => self.keyframes[0],
            n => {
                let position = percentage.clamp(0., 1.) * (n - 1) as f32;
                let index = (position.floor() as usize).min(n - 2);
                let t = position - index as f32;
                self.keyframes[index].interpolate(&self.keyframes[index + 1], t)
            }
        }
    }
}

/// Animation data the graph reads. Loading these is somebody else's job; the graph only ever
/// sees them through shared read-only handles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Seconds
    pub duration: f32,
    /// Meters per second of root displacement, averaged over the clip
    pub average_linear_velocity: f32,
    #[serde(default)]
    pub events: Vec<ClipEvent>,
    #[serde(default = "SyncTrack::default_track")]
    pub sync_track: Arc<SyncTrack>,
    #[serde(default)]
    pub tracks: Vec<BoneTrack>,
}

impl AnimationClip {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            average_linear_velocity: 0.,
            events: Vec::new(),
            sync_track: SyncTrack::default_track(),
            tracks: Vec::new(),
        }
    }

    pub fn with_average_linear_velocity(mut self, velocity: f32) -> Self {
        self.average_linear_velocity = velocity;
        self
    }

    pub fn with_event(mut self, event: ClipEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_sync_track(mut self, sync_track: SyncTrack) -> Self {
        self.sync_track = Arc::new(sync_track);
        self
    }

    pub fn with_track(mut self, track: BoneTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn sample_pose(&self, percentage: f32) -> Pose {
        Pose {
            bones: self.tracks.iter().map(|t| t.sample(percentage)).collect(),
            sample_time: percentage,
        }
    }

    /// Calls `sink` for every event overlapping the forward range `[from, to)`, with how far
    /// through the event the range end is.
    pub fn sample_events(&self, from: f32, to: f32, mut sink: impl FnMut(&ClipEvent, f32)) {
        for event in &self.events {
            if event.duration <= 0. {
                if event.start_time >= from && event.start_time < to {
                    sink(event, 1.);
                }
            } else {
                let end_time = event.start_time + event.duration;
                if event.start_time < to && end_time > from {
                    let percentage_through = (to.min(end_time) - event.start_time) / event.duration;
                    sink(event, percentage_through);
                }
            }
        }
    }
}
