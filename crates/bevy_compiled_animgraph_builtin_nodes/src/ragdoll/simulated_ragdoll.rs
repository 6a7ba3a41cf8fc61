use std::{any::Any, sync::Arc};

use bevy::reflect::Reflect;
use bevy_compiled_animgraph_core::{
    animation_node::{
        GraphNode, NodeBase, PoseNode, PoseNodePtr, PoseNodeResult, PoseNodeTiming, RuntimeNode,
    },
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase, VariationData},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::{GraphValueType, events::SampledEventRange},
    errors::{CompilationError, GraphResult, RecordingError},
    ids::{NodeIndex, ResourceId, ResourceSlot, StringId},
    instantiation::InstantiationContext,
    pose::Pose,
    recording::{GraphStateReader, GraphStateRecorder},
    resources::RagdollDefinition,
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
    utils::math::NEAR_ZERO,
};
use serde::{Deserialize, Serialize};

use super::compile_ragdoll_resource;

#[derive(Debug, Clone)]
pub struct SimulatedRagdollToolsNode {
    pub base: ToolsNodeBase,
    pub ragdoll: VariationData<ResourceId>,
    pub entry_profile_id: StringId,
    pub simulated_profile_id: StringId,
    pub exit_profile_id: StringId,
}

impl SimulatedRagdollToolsNode {
    pub const IN_ENTRY: usize = 0;

    pub fn new(
        ragdoll: impl Into<ResourceId>,
        entry_profile_id: impl Into<StringId>,
        simulated_profile_id: impl Into<StringId>,
    ) -> Self {
        Self {
            base: ToolsNodeBase::new("Simulated Ragdoll")
                .with_input("Input", GraphValueType::Pose)
                .with_input("Exit Option", GraphValueType::Pose),
            ragdoll: VariationData::new(ragdoll.into()),
            entry_profile_id: entry_profile_id.into(),
            simulated_profile_id: simulated_profile_id.into(),
            exit_profile_id: StringId::default(),
        }
    }

    pub fn with_exit_profile(mut self, exit_profile_id: impl Into<StringId>) -> Self {
        self.exit_profile_id = exit_profile_id.into();
        self
    }

    /// Pin of the `n`-th exit option.
    pub fn exit_option_pin(n: usize) -> usize {
        Self::IN_ENTRY + 1 + n
    }

    /// Adds another exit option pin and returns it.
    pub fn add_exit_option(&mut self) -> usize {
        self.base.add_input("Exit Option", GraphValueType::Pose)
    }
}

impl ToolsNode for SimulatedRagdollToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Simulated Ragdoll"
    }

    fn category(&self) -> &'static str {
        "Physics"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn is_valid_connection(&self, _: usize, source: &dyn ToolsNode) -> bool {
        source.is_animation_clip_reference_node()
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            if !self.entry_profile_id.is_valid() {
                return Err(CompilationError::InvalidIdentifier("entry profile ID"));
            }
            if !self.simulated_profile_id.is_valid() {
                return Err(CompilationError::InvalidIdentifier("simulated profile ID"));
            }

            let entry_node_index = ctx.compile_required_input(Self::IN_ENTRY)?;

            let mut exit_option_node_indices = Vec::new();
            for pin in Self::exit_option_pin(0)..ctx.num_input_pins() {
                let index = ctx.compile_optional_input(pin)?;
                if index.is_valid() {
                    exit_option_node_indices.push(index);
                }
            }

            if !exit_option_node_indices.is_empty() && !self.exit_profile_id.is_valid() {
                return Err(CompilationError::InvalidIdentifier("exit profile ID"));
            }

            Ok(SimulatedRagdollDefinition {
                node_index: NodeIndex::INVALID,
                entry_node_index,
                exit_option_node_indices,
                ragdoll_slot: compile_ragdoll_resource(ctx, &self.ragdoll)?,
                entry_profile_id: self.entry_profile_id.clone(),
                simulated_profile_id: self.simulated_profile_id.clone(),
                exit_profile_id: self.exit_profile_id.clone(),
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedRagdollDefinition {
    pub node_index: NodeIndex,
    pub entry_node_index: NodeIndex,
    pub exit_option_node_indices: Vec<NodeIndex>,
    pub ragdoll_slot: ResourceSlot,
    pub entry_profile_id: StringId,
    pub simulated_profile_id: StringId,
    pub exit_profile_id: StringId,
}

impl NodeDefinition for SimulatedRagdollDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "SimulatedRagdoll"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        let mut indices = vec![self.entry_node_index];
        indices.extend_from_slice(&self.exit_option_node_indices);
        indices
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        let exit_options = self
            .exit_option_node_indices
            .iter()
            .map(|index| ctx.clip_reference_node_ptr(*index))
            .collect::<GraphResult<Vec<_>>>()?;

        Ok(RuntimeNode::pose(SimulatedRagdollNode {
            base: NodeBase::new(self.node_index),
            entry: ctx.clip_reference_node_ptr(self.entry_node_index)?,
            exit_options,
            ragdoll: ctx.ragdoll_definition(self.ragdoll_slot)?,
            entry_profile_id: self.entry_profile_id.clone(),
            simulated_profile_id: self.simulated_profile_id.clone(),
            exit_profile_id: self.exit_profile_id.clone(),
            stage: SimulatedRagdollStage::Entry,
            simulated_updates: 0,
            final_pose: None,
            timing: PoseNodeTiming::default(),
            sync_track: SyncTrack::default_track(),
            is_valid: false,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulatedRagdollStage {
    /// Playing the entry clip under the entry profile
    #[default]
    Entry,
    /// Entry finished; the ragdoll is simulated from its final pose
    Simulated,
    /// Playing the chosen exit option
    Exit(usize),
}

/// Plays an entry clip into a fully simulated ragdoll, then optionally blends back to
/// animation through the first valid exit option.
#[derive(Debug)]
pub struct SimulatedRagdollNode {
    base: NodeBase,
    entry: PoseNodePtr,
    exit_options: Vec<PoseNodePtr>,
    ragdoll: Option<Arc<RagdollDefinition>>,
    entry_profile_id: StringId,
    simulated_profile_id: StringId,
    exit_profile_id: StringId,
    stage: SimulatedRagdollStage,
    simulated_updates: u32,
    final_pose: Option<Pose>,
    timing: PoseNodeTiming,
    sync_track: Arc<SyncTrack>,
    is_valid: bool,
}

impl SimulatedRagdollNode {
    pub fn stage(&self) -> SimulatedRagdollStage {
        self.stage
    }

    /// Physics profile the ragdoll should use in the current stage.
    pub fn active_profile_id(&self) -> &StringId {
        match self.stage {
            SimulatedRagdollStage::Entry => &self.entry_profile_id,
            SimulatedRagdollStage::Simulated => &self.simulated_profile_id,
            SimulatedRagdollStage::Exit(_) => &self.exit_profile_id,
        }
    }

    /// Pose the simulation starts from, once the entry has completed.
    pub fn final_pose(&self) -> Option<&Pose> {
        self.final_pose.as_ref()
    }

    fn supports_profiles(&self) -> bool {
        self.ragdoll.as_ref().is_some_and(|ragdoll| {
            ragdoll.has_profile(&self.entry_profile_id)
                && ragdoll.has_profile(&self.simulated_profile_id)
                && (self.exit_options.is_empty() || ragdoll.has_profile(&self.exit_profile_id))
        })
    }

    fn active_child(&self) -> Option<PoseNodePtr> {
        match self.stage {
            SimulatedRagdollStage::Entry => Some(self.entry),
            SimulatedRagdollStage::Simulated => None,
            SimulatedRagdollStage::Exit(option) => self.exit_options.get(option).copied(),
        }
    }

    fn mirror_child(&mut self, ctx: &GraphContext, child: PoseNodePtr) {
        let child = ctx.pose_node(child);
        self.timing = child.timing();
        self.sync_track = child.sync_track();
    }

    fn update_child(
        &mut self,
        ctx: &mut GraphContext,
        child: PoseNodePtr,
        update_range: Option<&SyncTrackTimeRange>,
    ) -> PoseNodeResult {
        let result = match update_range {
            Some(update_range) => ctx.update_pose_synchronized(child, update_range),
            None => ctx.update_pose(child),
        };
        self.mirror_child(ctx, child);
        result
    }

    fn update_entry(
        &mut self,
        ctx: &mut GraphContext,
        update_range: Option<&SyncTrackTimeRange>,
    ) -> PoseNodeResult {
        let result = self.update_child(ctx, self.entry, update_range);

        let completed =
            self.timing.current_time >= 1. - NEAR_ZERO || self.timing.loop_count > 0;
        if completed {
            self.final_pose = result.pose.clone();
            ctx.shutdown_pose(self.entry);
            self.stage = SimulatedRagdollStage::Simulated;
            self.simulated_updates = 0;
            self.sync_track = SyncTrack::default_track();
        }

        result
    }

    fn update_simulated(
        &mut self,
        ctx: &mut GraphContext,
        update_range: Option<&SyncTrackTimeRange>,
    ) -> PoseNodeResult {
        if self.simulated_updates > 0 {
            let exit = self
                .exit_options
                .iter()
                .position(|option| ctx.pose_node(*option).is_valid());
            if let Some(option) = exit {
                let child = self.exit_options[option];
                ctx.initialize_pose(child, SyncTrackTime::default());
                self.stage = SimulatedRagdollStage::Exit(option);
                return self.update_child(ctx, child, update_range);
            }
        }

        self.simulated_updates = self.simulated_updates.saturating_add(1);
        self.timing.previous_time = self.timing.current_time;
        PoseNodeResult {
            pose: self.final_pose.clone(),
            sampled_event_range: SampledEventRange::empty_at(
                ctx.sampled_events.num_sampled_events(),
            ),
        }
    }

    fn update_stage(
        &mut self,
        ctx: &mut GraphContext,
        update_range: Option<&SyncTrackTimeRange>,
    ) -> PoseNodeResult {
        if !self.is_valid {
            return PoseNodeResult::empty(ctx);
        }

        match self.stage {
            SimulatedRagdollStage::Entry => self.update_entry(ctx, update_range),
            SimulatedRagdollStage::Simulated => self.update_simulated(ctx, update_range),
            SimulatedRagdollStage::Exit(option) => match self.exit_options.get(option).copied() {
                Some(child) => self.update_child(ctx, child, update_range),
                None => PoseNodeResult::empty(ctx),
            },
        }
    }
}

impl GraphNode for SimulatedRagdollNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        recorder.write(&self.stage)?;
        recorder.write(&self.simulated_updates)?;
        recorder.write(&self.final_pose)?;
        recorder.write(&self.timing)
    }

    fn restore_graph_state(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.stage = reader.read()?;
        self.simulated_updates = reader.read()?;
        self.final_pose = reader.read()?;
        self.timing = reader.read()?;
        Ok(())
    }
}

impl PoseNode for SimulatedRagdollNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        self.stage = SimulatedRagdollStage::Entry;
        self.simulated_updates = 0;
        self.final_pose = None;

        ctx.initialize_pose(self.entry, initial_time);
        self.mirror_child(ctx, self.entry);
        self.is_valid = self.supports_profiles() && ctx.pose_node(self.entry).is_valid();
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        if let Some(child) = self.active_child() {
            ctx.shutdown_pose(child);
        }
        self.final_pose = None;
        self.is_valid = false;
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        self.update_stage(ctx, None)
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        self.update_stage(ctx, Some(update_range))
    }

    fn timing(&self) -> PoseNodeTiming {
        self.timing
    }

    fn is_valid(&self) -> bool {
        self.is_valid
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        self.sync_track.clone()
    }
}
