use std::{any::Any, sync::Arc};

use bevy::reflect::Reflect;
use bevy_compiled_animgraph_core::{
    animation_node::{
        GraphNode, NodeBase, PoseNode, PoseNodePtr, PoseNodeResult, PoseNodeTiming, RuntimeNode,
        ValueNodePtr,
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
    utils::math::is_near_zero,
};
use serde::{Deserialize, Serialize};

use crate::speed_node::{BlendInRamp, scaled_duration, validate_blend_in_time};

#[derive(Debug, Clone)]
pub struct VelocityBasedSpeedScaleToolsNode {
    pub base: ToolsNodeBase,
    pub blend_in_time: f32,
}

impl VelocityBasedSpeedScaleToolsNode {
    pub const IN_CHILD: usize = 0;
    pub const IN_DESIRED_VELOCITY: usize = 1;

    pub fn new(blend_in_time: f32) -> Self {
        Self {
            base: ToolsNodeBase::new("Velocity Based Speed Scale")
                .with_input("Input", GraphValueType::Pose)
                .with_input("Desired Velocity", GraphValueType::Float),
            blend_in_time,
        }
    }
}

impl ToolsNode for VelocityBasedSpeedScaleToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Velocity Based Speed Scale"
    }

    fn category(&self) -> &'static str {
        "Animation"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn is_valid_connection(&self, pin: usize, source: &dyn ToolsNode) -> bool {
        pin != Self::IN_CHILD || source.is_animation_clip_reference_node()
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            validate_blend_in_time(self.blend_in_time)?;
            if ctx
                .connected_input_node(Self::IN_CHILD)
                .is_some_and(|child| !child.is_animation_clip_reference_node())
            {
                return Err(CompilationError::InvalidParameter {
                    field: "Input",
                    reason: "must be an animation clip reference".into(),
                });
            }

            Ok(VelocityBasedSpeedScaleDefinition {
                node_index: NodeIndex::INVALID,
                child_node_index: ctx.compile_required_input(Self::IN_CHILD)?,
                desired_velocity_value_node_index: ctx
                    .compile_required_input(Self::IN_DESIRED_VELOCITY)?,
                blend_in_time: self.blend_in_time,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct VelocityBasedSpeedScaleDefinition {
    pub node_index: NodeIndex,
    pub child_node_index: NodeIndex,
    pub desired_velocity_value_node_index: NodeIndex,
    /// Seconds
    pub blend_in_time: f32,
}

impl NodeDefinition for VelocityBasedSpeedScaleDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "VelocityBasedSpeedScale"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![self.child_node_index, self.desired_velocity_value_node_index]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(VelocityBasedSpeedScaleNode {
            base: NodeBase::new(self.node_index),
            child: ctx.clip_reference_node_ptr(self.child_node_index)?,
            desired_velocity: ctx.value_node_ptr(self.desired_velocity_value_node_index)?,
            blend_in: BlendInRamp::new(self.blend_in_time),
            timing: PoseNodeTiming::default(),
            sync_track: SyncTrack::default_track(),
            is_valid: false,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Retimes a clip so that its root motion matches a desired velocity. Acts as a proxy for the
/// clip's timing rather than a passthrough.
#[derive(Debug)]
pub struct VelocityBasedSpeedScaleNode {
    base: NodeBase,
    child: PoseNodePtr,
    desired_velocity: ValueNodePtr<f32>,
    blend_in: BlendInRamp,
    timing: PoseNodeTiming,
    sync_track: Arc<SyncTrack>,
    is_valid: bool,
}

impl VelocityBasedSpeedScaleNode {
    pub fn blend_weight(&self) -> f32 {
        self.blend_in.weight()
    }

    fn speed_multiplier(&self, ctx: &mut GraphContext) -> f32 {
        let desired_velocity = ctx.get_value(self.desired_velocity);
        if desired_velocity < 0. {
            ctx.log_warning(
                self.base.node_index,
                format_args!("requested negative velocity {desired_velocity}, ignoring it"),
            );
        }
        self.multiplier_for(ctx, desired_velocity)
    }

    fn multiplier_for(&self, ctx: &GraphContext, desired_velocity: f32) -> f32 {
        if desired_velocity < 0. {
            return 1.;
        }

        match ctx
            .pose_node(self.child)
            .animation_clip()
            .map(|clip| clip.average_linear_velocity)
        {
            Some(average_velocity) if !is_near_zero(average_velocity) => {
                desired_velocity / average_velocity
            }
            _ => 0.,
        }
    }

    fn mirror_child(&mut self, ctx: &GraphContext) {
        let child = ctx.pose_node(self.child);
        self.is_valid = child.is_valid();
        if self.is_valid {
            self.timing = child.timing();
            self.sync_track = child.sync_track();
        }
    }
}

impl GraphNode for VelocityBasedSpeedScaleNode {
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

impl PoseNode for VelocityBasedSpeedScaleNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        ctx.initialize_value(self.desired_velocity);
        self.blend_in.reset();
        self.timing = PoseNodeTiming {
            duration: 1.,
            ..Default::default()
        };
        self.sync_track = SyncTrack::default_track();

        ctx.initialize_pose(self.child, initial_time);
        self.mirror_child(ctx);
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        ctx.shutdown_pose(self.child);
        ctx.shutdown_value(self.desired_velocity);
        self.is_valid = false;
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        if !ctx.pose_node(self.child).is_valid() {
            self.is_valid = false;
            return PoseNodeResult::empty(ctx);
        }

        let target = self.speed_multiplier(ctx);
        let multiplier = self.blend_in.apply(ctx.delta_time, target);
        let frozen = is_near_zero(multiplier);

        let result = {
            let mut ctx = ctx.scoped_delta_time();
            if frozen {
                ctx.delta_time = 0.;
            } else {
                ctx.delta_time *= multiplier;
            }
            ctx.update_pose(self.child)
        };

        self.mirror_child(ctx);
        self.timing.duration = scaled_duration(self.timing.duration, multiplier);
        result
    }

    fn refresh_from_children(&mut self, ctx: &mut GraphContext) {
        self.mirror_child(ctx);
        if !self.is_valid {
            return;
        }

        let desired_velocity = ctx.get_value(self.desired_velocity);
        let multiplier = self
            .blend_in
            .current(self.multiplier_for(ctx, desired_velocity));
        self.timing.duration = scaled_duration(self.timing.duration, multiplier);
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

        if !ctx.pose_node(self.child).is_valid() {
            self.is_valid = false;
            return PoseNodeResult::empty(ctx);
        }

        let result = ctx.update_pose_synchronized(self.child, update_range);
        self.mirror_child(ctx);
        result
    }

    fn timing(&self) -> PoseNodeTiming {
        self.timing
    }

    fn is_valid(&self) -> bool {
        self.is_valid
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        if self.is_valid {
            self.sync_track.clone()
        } else {
            SyncTrack::default_track()
        }
    }
}
