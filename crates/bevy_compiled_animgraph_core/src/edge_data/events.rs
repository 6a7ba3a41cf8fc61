use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use serde::{Deserialize, Serialize};

use crate::ids::{NodeIndex, StringId};

/// Structure containing a sampled event and relevant metadata
#[derive(Clone, Debug, Reflect, Serialize, Deserialize, PartialEq)]
#[reflect(Default)]
pub struct SampledEvent {
    /// Node that raised the event
    pub source_node: NodeIndex,
    /// Event that was sampled
    pub id: StringId,
    /// Weight of event (is reduced by blending, for example), 0.0 to 1.0
    pub weight: f32,
    /// Percentage of total event duration at sampling time, 0.0 to 1.0
    pub percentage_through: f32,
    /// Whether the branch that raised it was active (not transitioning out)
    pub is_from_active_branch: bool,
}

impl Default for SampledEvent {
    fn default() -> Self {
        Self {
            source_node: NodeIndex::INVALID,
            id: StringId::default(),
            weight: 1.,
            percentage_through: 1.,
            is_from_active_branch: true,
        }
    }
}

impl SampledEvent {
    pub fn instant(source_node: NodeIndex, id: StringId) -> Self {
        Self {
            source_node,
            id,
            ..Default::default()
        }
    }
}

/// `[start_index, end_index)` slice of a [`SampledEventsBuffer`] attributable to the update of a
/// subtree.
#[derive(Clone, Copy, Debug, Reflect, Default, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Default)]
pub struct SampledEventRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl SampledEventRange {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        debug_assert!(start_index <= end_index);
        Self {
            start_index,
            end_index,
        }
    }

    /// Empty range anchored at a buffer position, usually the current buffer length.
    pub fn empty_at(index: usize) -> Self {
        Self {
            start_index: index,
            end_index: index,
        }
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// Smallest range covering both. Empty ranges do not widen the result.
    pub fn combine(self, other: Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Self::empty_at(self.start_index.min(other.start_index)),
            (true, false) => other,
            (false, true) => self,
            (false, false) => Self {
                start_index: self.start_index.min(other.start_index),
                end_index: self.end_index.max(other.end_index),
            },
        }
    }
}

/// Append-only list of events sampled during a single frame. The owner resets it at frame
/// boundaries.
#[derive(Clone, Debug, Default, Reflect)]
pub struct SampledEventsBuffer {
    events: Vec<SampledEvent>,
}

impl SampledEventsBuffer {
    pub fn num_sampled_events(&self) -> usize {
        self.events.len()
    }

    pub fn push(&mut self, event: SampledEvent) -> usize {
        self.events.push(event);
        self.events.len() - 1
    }

    pub fn reset(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[SampledEvent] {
        &self.events
    }

    pub fn events_in(&self, range: SampledEventRange) -> &[SampledEvent] {
        let end = range.end_index.min(self.events.len());
        let start = range.start_index.min(end);
        &self.events[start..end]
    }

    /// Scales the weight of every event in a range, e.g. when the subtree is blended out.
    pub fn scale_weights(&mut self, range: SampledEventRange, weight: f32) {
        let end = range.end_index.min(self.events.len());
        let start = range.start_index.min(end);
        for event in &mut self.events[start..end] {
            event.weight *= weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_ignores_empty_ranges() {
        let a = SampledEventRange::new(2, 4);
        let b = SampledEventRange::empty_at(4);
        assert_eq!(a.combine(b), a);
        assert_eq!(b.combine(a), a);
        assert_eq!(a.combine(SampledEventRange::new(4, 7)), SampledEventRange::new(2, 7));
    }

    #[test]
    fn events_in_range_are_the_ones_pushed_during_it() {
        let mut buffer = SampledEventsBuffer::default();
        buffer.push(SampledEvent::instant(NodeIndex(0), "a".into()));
        let start = buffer.num_sampled_events();
        buffer.push(SampledEvent::instant(NodeIndex(1), "b".into()));
        buffer.push(SampledEvent::instant(NodeIndex(1), "c".into()));
        let range = SampledEventRange::new(start, buffer.num_sampled_events());

        let ids: Vec<_> = buffer
            .events_in(range)
            .iter()
            .map(|event| event.id.as_str())
            .collect();
        assert_eq!(ids, ["b", "c"]);

        buffer.scale_weights(range, 0.5);
        assert_eq!(buffer.events()[0].weight, 1.0);
        assert_eq!(buffer.events()[2].weight, 0.5);
    }
}
