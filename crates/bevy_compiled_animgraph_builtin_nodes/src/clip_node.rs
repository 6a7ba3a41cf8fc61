use std::{any::Any, sync::Arc};

use bevy::reflect::Reflect;
use bevy_compiled_animgraph_core::{
    animation_clip::{AnimationClip, ClipEvent},
    animation_node::{
        GraphNode, NodeBase, PoseNode, PoseNodeResult, PoseNodeTiming, RuntimeNode,
    },
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase, VariationData},
    context::{BranchState, GraphContext},
    definition::NodeDefinition,
    edge_data::{
        GraphValueType,
        events::{SampledEvent, SampledEventRange},
    },
    errors::{CompilationError, GraphResult, RecordingError},
    ids::{NodeIndex, ResourceId, ResourceSlot},
    instantiation::InstantiationContext,
    recording::{GraphStateReader, GraphStateRecorder},
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AnimationClipToolsNode {
    pub base: ToolsNodeBase,
    pub clip: VariationData<ResourceId>,
    pub allow_looping: bool,
}

impl AnimationClipToolsNode {
    pub fn new(clip: impl Into<ResourceId>) -> Self {
        Self {
            base: ToolsNodeBase::new("Animation Clip"),
            clip: VariationData::new(clip.into()),
            allow_looping: true,
        }
    }

    pub fn with_looping(mut self, allow_looping: bool) -> Self {
        self.allow_looping = allow_looping;
        self
    }
}

impl ToolsNode for AnimationClipToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Animation Clip"
    }

    fn category(&self) -> &'static str {
        "Animation"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn is_animation_clip_reference_node(&self) -> bool {
        true
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            let clip = ctx.resolve_variation_data(&self.clip)?.clone();
            if !clip.is_valid() {
                return Err(CompilationError::InvalidIdentifier("animation clip"));
            }

            Ok(AnimationClipDefinition {
                node_index: NodeIndex::INVALID,
                clip_slot: ctx.register_resource(&clip)?,
                allow_looping: self.allow_looping,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct AnimationClipDefinition {
    pub node_index: NodeIndex,
    pub clip_slot: ResourceSlot,
    pub allow_looping: bool,
}

impl NodeDefinition for AnimationClipDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "AnimationClip"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        Vec::new()
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(AnimationClipNode {
            base: NodeBase::new(self.node_index),
            clip: ctx.animation_clip(self.clip_slot)?,
            allow_looping: self.allow_looping,
            timing: PoseNodeTiming::default(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Plays a single clip. Leaf of every pose subtree, and the only node that samples clip events.
#[derive(Debug)]
pub struct AnimationClipNode {
    base: NodeBase,
    clip: Option<Arc<AnimationClip>>,
    allow_looping: bool,
    timing: PoseNodeTiming,
}

impl AnimationClipNode {
    fn clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref().filter(|clip| clip.duration > 0.)
    }

    /// Samples events and pose for the playback interval `[previous_time, current_time)`,
    /// which wraps around the clip end if `looped` is set.
    fn sample(&self, ctx: &mut GraphContext, looped: bool) -> PoseNodeResult {
        let Some(clip) = self.clip() else {
            return PoseNodeResult::empty(ctx);
        };

        let start_index = ctx.sampled_events.num_sampled_events();
        let is_from_active_branch = ctx.branch_state == BranchState::Active;
        let mut push = |event: &ClipEvent, percentage_through: f32| {
            ctx.sampled_events.push(SampledEvent {
                source_node: self.base.node_index,
                id: event.id.clone(),
                weight: 1.,
                percentage_through,
                is_from_active_branch,
            });
        };

        let PoseNodeTiming {
            previous_time,
            current_time,
            ..
        } = self.timing;
        if looped {
            clip.sample_events(previous_time, 1., &mut push);
            clip.sample_events(0., current_time, &mut push);
        } else {
            clip.sample_events(previous_time, current_time, &mut push);
        }

        PoseNodeResult {
            pose: Some(clip.sample_pose(current_time)),
            sampled_event_range: SampledEventRange::new(
                start_index,
                ctx.sampled_events.num_sampled_events(),
            ),
        }
    }
}

impl GraphNode for AnimationClipNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        recorder.write(&self.timing.previous_time)?;
        recorder.write(&self.timing.current_time)?;
        recorder.write(&self.timing.loop_count)
    }

    fn restore_graph_state(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.timing.previous_time = reader.read()?;
        self.timing.current_time = reader.read()?;
        self.timing.loop_count = reader.read()?;
        Ok(())
    }
}

impl PoseNode for AnimationClipNode {
    fn initialize_internal(&mut self, _: &mut GraphContext, initial_time: SyncTrackTime) {
        let (duration, start_time) = match self.clip() {
            Some(clip) => (
                clip.duration,
                clip.sync_track.get_percentage_through(initial_time),
            ),
            None => (0., 0.),
        };

        self.timing = PoseNodeTiming {
            previous_time: start_time,
            current_time: start_time,
            duration,
            loop_count: 0,
        };
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        if !self.is_valid() {
            return PoseNodeResult::empty(ctx);
        }

        let delta = ctx.delta_time / self.timing.duration;
        let mut new_time = (self.timing.current_time + delta).max(0.);
        let mut looped = false;
        if new_time >= 1. {
            if self.allow_looping {
                self.timing.loop_count += new_time.floor() as u32;
                new_time = new_time.fract();
                looped = true;
            } else {
                new_time = 1.;
            }
        }

        self.timing.previous_time = self.timing.current_time;
        self.timing.current_time = new_time;
        self.sample(ctx, looped)
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        let Some(clip) = self.clip() else {
            return PoseNodeResult::empty(ctx);
        };

        let start_time = clip.sync_track.get_percentage_through(update_range.start_time);
        let end_time = clip.sync_track.get_percentage_through(update_range.end_time);
        let looped = end_time < start_time;
        if looped {
            self.timing.loop_count += 1;
        }

        self.timing.previous_time = start_time;
        self.timing.current_time = end_time;
        self.sample(ctx, looped)
    }

    fn timing(&self) -> PoseNodeTiming {
        self.timing
    }

    fn is_valid(&self) -> bool {
        self.clip().is_some()
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        self.clip()
            .map_or_else(SyncTrack::default_track, |clip| clip.sync_track.clone())
    }

    fn is_clip_reference(&self) -> bool {
        true
    }

    fn animation_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }
}
