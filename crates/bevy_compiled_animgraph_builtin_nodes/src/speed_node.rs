use std::{any::Any, sync::Arc};

use bevy::reflect::Reflect;
use bevy_compiled_animgraph_core::{
    animation_node::{
        GraphNode, NodeBase, PassthroughDefinition, PassthroughNode, PoseNode, PoseNodeResult,
        PoseNodeTiming, RuntimeNode, ValueNodePtr,
    },
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::GraphValueType,
    errors::{CompilationError, GraphResult, RecordingError},
    ids::NodeIndex,
    instantiation::InstantiationContext,
    recording::{GraphStateReader, GraphStateRecorder},
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
    utils::math::{is_near_zero, lerp},
};
use serde::{Deserialize, Serialize};

/// Duration of a child played back `scale` times faster. Near-zero scales freeze it.
pub(crate) fn scaled_duration(duration: f32, scale: f32) -> f32 {
    if is_near_zero(scale) {
        0.
    } else {
        duration / scale
    }
}

/// Ramps a speed multiplier in from 1.0 over `blend_in_time` seconds after activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BlendInRamp {
    blend_in_time: f32,
    weight: f32,
}

impl BlendInRamp {
    pub fn new(blend_in_time: f32) -> Self {
        let mut ramp = Self {
            blend_in_time,
            weight: 1.,
        };
        ramp.reset();
        ramp
    }

    pub fn reset(&mut self) {
        self.weight = if self.blend_in_time > 0. { 0. } else { 1. };
    }

    /// Advances the ramp by `delta_time` and returns the multiplier to use this frame.
    pub fn apply(&mut self, delta_time: f32, target: f32) -> f32 {
        if self.blend_in_time > 0. && self.weight < 1. {
            self.weight = (self.weight + delta_time / self.blend_in_time).clamp(0., 1.);
            lerp(1., target, self.weight)
        } else {
            target
        }
    }

    /// Multiplier the last [`BlendInRamp::apply`] returned for `target`, without advancing.
    pub fn current(&self, target: f32) -> f32 {
        if self.blend_in_time > 0. {
            lerp(1., target, self.weight)
        } else {
            target
        }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn record(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        recorder.write(&self.weight)
    }

    pub fn restore(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.weight = reader.read()?;
        Ok(())
    }
}

pub(crate) fn validate_blend_in_time(blend_in_time: f32) -> Result<(), CompilationError> {
    if blend_in_time.is_finite() && blend_in_time >= 0. {
        Ok(())
    } else {
        Err(CompilationError::InvalidParameter {
            field: "blend_in_time",
            reason: format!("{blend_in_time} is not a non-negative number of seconds"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SpeedScaleToolsNode {
    pub base: ToolsNodeBase,
    pub blend_in_time: f32,
}

impl SpeedScaleToolsNode {
    pub const IN_CHILD: usize = 0;
    pub const IN_SCALE: usize = 1;

    pub fn new(blend_in_time: f32) -> Self {
        Self {
            base: ToolsNodeBase::new("Speed Scale")
                .with_input("Input", GraphValueType::Pose)
                .with_input("Scale", GraphValueType::Float),
            blend_in_time,
        }
    }
}

impl ToolsNode for SpeedScaleToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Speed Scale"
    }

    fn category(&self) -> &'static str {
        "Animation"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            validate_blend_in_time(self.blend_in_time)?;
            Ok(SpeedScaleDefinition {
                node_index: NodeIndex::INVALID,
                passthrough: PassthroughDefinition {
                    child_node_index: ctx.compile_required_input(Self::IN_CHILD)?,
                },
                scale_value_node_index: ctx.compile_required_input(Self::IN_SCALE)?,
                blend_in_time: self.blend_in_time,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct SpeedScaleDefinition {
    pub node_index: NodeIndex,
    pub passthrough: PassthroughDefinition,
    pub scale_value_node_index: NodeIndex,
    /// Seconds
    pub blend_in_time: f32,
}

impl NodeDefinition for SpeedScaleDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "SpeedScale"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![
            self.passthrough.child_node_index,
            self.scale_value_node_index,
        ]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(SpeedScaleNode {
            base: NodeBase::new(self.node_index),
            passthrough: PassthroughNode::instantiate(&self.passthrough, ctx)?,
            scale: ctx.value_node_ptr(self.scale_value_node_index)?,
            blend_in: BlendInRamp::new(self.blend_in_time),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Plays its child at a fixed multiple of the caller's rate and reports the duration that
/// rate implies.
#[derive(Debug)]
pub struct SpeedScaleNode {
    base: NodeBase,
    passthrough: PassthroughNode,
    scale: ValueNodePtr<f32>,
    blend_in: BlendInRamp,
}

impl SpeedScaleNode {
    pub fn blend_weight(&self) -> f32 {
        self.blend_in.weight()
    }
}

impl GraphNode for SpeedScaleNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        self.blend_in.record(recorder)
    }

    fn restore_graph_state(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.blend_in.restore(reader)
    }
}

impl PoseNode for SpeedScaleNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        self.passthrough.initialize(ctx, initial_time);
        ctx.initialize_value(self.scale);
        self.blend_in.reset();
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        ctx.shutdown_value(self.scale);
        self.passthrough.shutdown(ctx);
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        if !ctx.pose_node(self.passthrough.child()).is_valid() {
            return self.passthrough.update_child(ctx);
        }

        let target = ctx.get_value(self.scale);
        let scale = self.blend_in.apply(ctx.delta_time, target);
        let frozen = is_near_zero(scale);

        let result = {
            let mut ctx = ctx.scoped_delta_time();
            if frozen {
                ctx.delta_time = 0.;
            } else {
                ctx.delta_time *= scale;
            }
            self.passthrough.update_child(&mut ctx)
        };

        let timing = self.passthrough.timing_mut();
        timing.duration = scaled_duration(timing.duration, scale);
        result
    }

    fn refresh_from_children(&mut self, ctx: &mut GraphContext) {
        self.passthrough.refresh(ctx);
        if !self.passthrough.is_valid() {
            return;
        }

        let scale = self.blend_in.current(ctx.get_value(self.scale));
        let timing = self.passthrough.timing_mut();
        timing.duration = scaled_duration(timing.duration, scale);
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        ctx.log_warning(
            self.base.node_index,
            format_args!("speed scale nodes cannot follow a synchronized update, delegating"),
        );
        self.passthrough.update_child_synchronized(ctx, update_range)
    }

    fn timing(&self) -> PoseNodeTiming {
        self.passthrough.timing()
    }

    fn is_valid(&self) -> bool {
        self.passthrough.is_valid()
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        self.passthrough.sync_track()
    }
}
