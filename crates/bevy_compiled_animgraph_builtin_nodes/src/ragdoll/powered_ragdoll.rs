use std::{any::Any, sync::Arc};

use bevy::{math::Vec3, reflect::Reflect};
use bevy_compiled_animgraph_core::{
    animation_node::{
        GraphNode, NodeBase, PassthroughDefinition, PassthroughNode, PoseNode, PoseNodeResult,
        PoseNodeTiming, RuntimeNode, ValueNodePtr,
    },
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase, VariationData},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::GraphValueType,
    errors::{CompilationError, GraphResult},
    ids::{NodeIndex, ResourceId, ResourceSlot, StringId},
    instantiation::InstantiationContext,
    resources::RagdollDefinition,
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
};
use serde::{Deserialize, Serialize};

use super::{RagdollImpulse, compile_ragdoll_resource};

#[derive(Debug, Clone)]
pub struct PoweredRagdollToolsNode {
    pub base: ToolsNodeBase,
    pub ragdoll: VariationData<ResourceId>,
    /// Empty uses the ragdoll's default profile
    pub profile_id: StringId,
    /// Used when the blend weight pin is disconnected
    pub physics_blend_weight: f32,
    pub gravity_enabled: bool,
}

impl PoweredRagdollToolsNode {
    pub const IN_CHILD: usize = 0;
    pub const IN_PHYSICS_BLEND_WEIGHT: usize = 1;
    pub const IN_IMPULSE_ORIGIN: usize = 2;
    pub const IN_IMPULSE_FORCE: usize = 3;

    pub fn new(ragdoll: impl Into<ResourceId>) -> Self {
        Self {
            base: ToolsNodeBase::new("Powered Ragdoll")
                .with_input("Input", GraphValueType::Pose)
                .with_input("Physics Blend Weight", GraphValueType::Float)
                .with_input("Impulse Origin", GraphValueType::Vector)
                .with_input("Impulse Force", GraphValueType::Vector),
            ragdoll: VariationData::new(ragdoll.into()),
            profile_id: StringId::default(),
            physics_blend_weight: 1.,
            gravity_enabled: true,
        }
    }

    pub fn with_profile(mut self, profile_id: impl Into<StringId>) -> Self {
        self.profile_id = profile_id.into();
        self
    }

    pub fn with_physics_blend_weight(mut self, physics_blend_weight: f32) -> Self {
        self.physics_blend_weight = physics_blend_weight;
        self
    }

    pub fn with_gravity(mut self, gravity_enabled: bool) -> Self {
        self.gravity_enabled = gravity_enabled;
        self
    }
}

impl ToolsNode for PoweredRagdollToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Powered Ragdoll"
    }

    fn category(&self) -> &'static str {
        "Physics"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            let child_node_index = ctx.compile_required_input(Self::IN_CHILD)?;
            let physics_blend_weight_node_index =
                ctx.compile_optional_input(Self::IN_PHYSICS_BLEND_WEIGHT)?;

            let impulse_origin_node_index = ctx.compile_optional_input(Self::IN_IMPULSE_ORIGIN)?;
            let impulse_force_node_index = ctx.compile_optional_input(Self::IN_IMPULSE_FORCE)?;
            if impulse_origin_node_index.is_valid() != impulse_force_node_index.is_valid() {
                return Err(CompilationError::JointPresence {
                    feature: "impulse",
                    first: self.base.pin_name(Self::IN_IMPULSE_ORIGIN).to_string(),
                    second: self.base.pin_name(Self::IN_IMPULSE_FORCE).to_string(),
                });
            }

            Ok(PoweredRagdollDefinition {
                node_index: NodeIndex::INVALID,
                passthrough: PassthroughDefinition { child_node_index },
                physics_blend_weight_node_index,
                impulse_origin_node_index,
                impulse_force_node_index,
                ragdoll_slot: compile_ragdoll_resource(ctx, &self.ragdoll)?,
                profile_id: self.profile_id.clone(),
                physics_blend_weight: self.physics_blend_weight,
                gravity_enabled: self.gravity_enabled,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct PoweredRagdollDefinition {
    pub node_index: NodeIndex,
    pub passthrough: PassthroughDefinition,
    pub physics_blend_weight_node_index: NodeIndex,
    pub impulse_origin_node_index: NodeIndex,
    pub impulse_force_node_index: NodeIndex,
    pub ragdoll_slot: ResourceSlot,
    pub profile_id: StringId,
    pub physics_blend_weight: f32,
    pub gravity_enabled: bool,
}

impl NodeDefinition for PoweredRagdollDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "PoweredRagdoll"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![
            self.passthrough.child_node_index,
            self.physics_blend_weight_node_index,
            self.impulse_origin_node_index,
            self.impulse_force_node_index,
        ]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        let impulse_origin = ctx.optional_value_node_ptr(self.impulse_origin_node_index)?;
        let impulse_force = ctx.optional_value_node_ptr(self.impulse_force_node_index)?;

        Ok(RuntimeNode::pose(PoweredRagdollNode {
            base: NodeBase::new(self.node_index),
            passthrough: PassthroughNode::instantiate(&self.passthrough, ctx)?,
            physics_blend_weight_value: ctx
                .optional_value_node_ptr(self.physics_blend_weight_node_index)?,
            impulse: impulse_origin.zip(impulse_force),
            ragdoll: ctx.ragdoll_definition(self.ragdoll_slot)?,
            profile_id: self.profile_id.clone(),
            physics_blend_weight: self.physics_blend_weight,
            gravity_enabled: self.gravity_enabled,
            request: None,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// What the physics side should do with the ragdoll this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RagdollRequest {
    pub profile_id: StringId,
    /// 0 keeps the animated pose, 1 is fully simulated
    pub physics_blend_weight: f32,
    pub gravity_enabled: bool,
    pub impulse: Option<RagdollImpulse>,
}

/// Forwards its input pose and describes how a powered ragdoll should follow it.
#[derive(Debug)]
pub struct PoweredRagdollNode {
    base: NodeBase,
    passthrough: PassthroughNode,
    physics_blend_weight_value: Option<ValueNodePtr<f32>>,
    impulse: Option<(ValueNodePtr<Vec3>, ValueNodePtr<Vec3>)>,
    ragdoll: Option<Arc<RagdollDefinition>>,
    profile_id: StringId,
    physics_blend_weight: f32,
    gravity_enabled: bool,
    request: Option<RagdollRequest>,
}

impl PoweredRagdollNode {
    /// Set by the last update while the node is valid.
    pub fn request(&self) -> Option<&RagdollRequest> {
        self.request.as_ref()
    }

    fn has_ragdoll(&self) -> bool {
        self.ragdoll.as_ref().is_some_and(|ragdoll| {
            !self.profile_id.is_valid() || ragdoll.has_profile(&self.profile_id)
        })
    }

    fn evaluate_request(&mut self, ctx: &mut GraphContext) {
        if !self.is_valid() {
            self.request = None;
            return;
        }

        let physics_blend_weight = match self.physics_blend_weight_value {
            Some(weight) => ctx.get_value(weight),
            None => self.physics_blend_weight,
        };
        let impulse = self.impulse.map(|(origin, force)| RagdollImpulse {
            origin: ctx.get_value(origin),
            force: ctx.get_value(force),
        });

        self.request = Some(RagdollRequest {
            profile_id: self.profile_id.clone(),
            physics_blend_weight: physics_blend_weight.clamp(0., 1.),
            gravity_enabled: self.gravity_enabled,
            impulse,
        });
    }
}

impl GraphNode for PoweredRagdollNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl PoseNode for PoweredRagdollNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        self.passthrough.initialize(ctx, initial_time);
        if let Some(weight) = self.physics_blend_weight_value {
            ctx.initialize_value(weight);
        }
        if let Some((origin, force)) = self.impulse {
            ctx.initialize_value(origin);
            ctx.initialize_value(force);
        }
        self.request = None;
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        if let Some((origin, force)) = self.impulse {
            ctx.shutdown_value(force);
            ctx.shutdown_value(origin);
        }
        if let Some(weight) = self.physics_blend_weight_value {
            ctx.shutdown_value(weight);
        }
        self.passthrough.shutdown(ctx);
        self.request = None;
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        let result = self.passthrough.update_child(ctx);
        self.evaluate_request(ctx);
        result
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        let result = self.passthrough.update_child_synchronized(ctx, update_range);
        self.evaluate_request(ctx);
        result
    }

    fn timing(&self) -> PoseNodeTiming {
        self.passthrough.timing()
    }

    fn refresh_from_children(&mut self, ctx: &mut GraphContext) {
        self.passthrough.refresh(ctx);
    }

    fn is_valid(&self) -> bool {
        self.passthrough.is_valid() && self.has_ragdoll()
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        self.passthrough.sync_track()
    }
}
