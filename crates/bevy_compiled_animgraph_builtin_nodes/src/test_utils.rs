//! Graph authoring helpers and probe nodes shared by the node tests.

use std::{any::Any, sync::Arc};

use bevy_compiled_animgraph_core::{
    animation_clip::AnimationClip,
    animation_node::{
        GraphNode, NodeBase, PassthroughDefinition, PassthroughNode, PoseNode, PoseNodeResult,
        PoseNodeTiming, RuntimeNode, ValueNode, ValueNodePtr,
    },
    compilation::{
        CompilationSettings, GraphCompilationContext, ToolsGraph, ToolsNode, ToolsNodeBase,
        compile_graph,
    },
    context::{BranchState, GraphContext},
    definition::{CompiledGraph, NodeDefinition},
    edge_data::{GraphValue, GraphValueType},
    errors::{CompilationFailure, GraphResult},
    ids::{NodeIndex, ToolsNodeId},
    instance::GraphInstance,
    instantiation::InstantiationContext,
    resources::{GraphDataSet, RagdollDefinition},
    settings::GraphRuntimeSettings,
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
};

/// Authoring, compiling and instantiating a graph in one place.
pub struct TestGraph {
    pub graph: ToolsGraph,
    pub data: GraphDataSet,
    pub settings: CompilationSettings,
}

impl TestGraph {
    pub fn new() -> Self {
        Self {
            graph: ToolsGraph::new(),
            data: GraphDataSet::new(),
            settings: CompilationSettings::default(),
        }
    }

    pub fn with_clip(mut self, id: &str, clip: AnimationClip) -> Self {
        self.data = self.data.with_clip(id, clip);
        self
    }

    pub fn with_ragdoll(mut self, id: &str, ragdoll: RagdollDefinition) -> Self {
        self.data = self.data.with_ragdoll(id, ragdoll);
        self
    }

    pub fn add(&mut self, node: impl ToolsNode) -> ToolsNodeId {
        self.graph.add_node(node)
    }

    pub fn connect(&mut self, source: ToolsNodeId, target: ToolsNodeId, pin: usize) {
        self.graph.connect(source, target, pin).unwrap();
    }

    pub fn compile(&self, root: ToolsNodeId) -> Result<CompiledGraph, CompilationFailure> {
        compile_graph(&self.graph, root, self.settings.clone())
    }

    pub fn instantiate(&self, root: ToolsNodeId) -> GraphInstance {
        let compiled = self.compile(root).unwrap();
        GraphInstance::new(
            Arc::new(compiled),
            &self.data,
            &GraphRuntimeSettings::development(),
        )
        .unwrap()
    }
}

// --- Clock
// ----------------------------------------------------------------------------------------

/// Float value equal to the current update id.
#[derive(Debug)]
pub struct ClockToolsNode {
    pub base: ToolsNodeBase,
}

impl ClockToolsNode {
    pub fn new() -> Self {
        Self {
            base: ToolsNodeBase::new("Clock"),
        }
    }
}

impl ToolsNode for ClockToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Clock"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Float
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |_| {
            Ok(ClockDefinition {
                node_index: NodeIndex::INVALID,
            })
        })
    }
}

#[derive(Debug)]
pub struct ClockDefinition {
    pub node_index: NodeIndex,
}

impl NodeDefinition for ClockDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "Clock"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        Vec::new()
    }

    fn instantiate_node(&self, _: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::value(ClockNode {
            base: NodeBase::new(self.node_index),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct ClockNode {
    base: NodeBase,
}

impl GraphNode for ClockNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl ValueNode for ClockNode {
    fn value_type(&self) -> GraphValueType {
        GraphValueType::Float
    }

    fn get_value(&mut self, ctx: &mut GraphContext) -> GraphValue {
        GraphValue::Float(ctx.update_id as f32)
    }
}

// --- Probe
// ----------------------------------------------------------------------------------------

/// Passthrough that records the delta time it sees once its child returns, and optionally
/// marks its subtree inactive from a given update on.
#[derive(Debug)]
pub struct ProbeToolsNode {
    pub base: ToolsNodeBase,
    pub inactive_from: Option<u64>,
}

impl ProbeToolsNode {
    pub const IN_CHILD: usize = 0;

    pub fn new() -> Self {
        Self {
            base: ToolsNodeBase::new("Probe").with_input("Input", GraphValueType::Pose),
            inactive_from: None,
        }
    }

    pub fn inactive_from(mut self, update_id: u64) -> Self {
        self.inactive_from = Some(update_id);
        self
    }
}

impl ToolsNode for ProbeToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Probe"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            Ok(ProbeDefinition {
                node_index: NodeIndex::INVALID,
                passthrough: PassthroughDefinition {
                    child_node_index: ctx.compile_required_input(Self::IN_CHILD)?,
                },
                inactive_from: self.inactive_from,
            })
        })
    }
}

#[derive(Debug)]
pub struct ProbeDefinition {
    pub node_index: NodeIndex,
    pub passthrough: PassthroughDefinition,
    pub inactive_from: Option<u64>,
}

impl NodeDefinition for ProbeDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "Probe"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![self.passthrough.child_node_index]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(ProbeNode {
            base: NodeBase::new(self.node_index),
            passthrough: PassthroughNode::instantiate(&self.passthrough, ctx)?,
            inactive_from: self.inactive_from,
            delta_times_after_child: Vec::new(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct ProbeNode {
    base: NodeBase,
    passthrough: PassthroughNode,
    inactive_from: Option<u64>,
    pub delta_times_after_child: Vec<f32>,
}

impl ProbeNode {
    fn enter_branch(&self, ctx: &mut GraphContext) -> BranchState {
        let previous = ctx.branch_state;
        if self.inactive_from.is_some_and(|from| ctx.update_id >= from) {
            ctx.branch_state = BranchState::Inactive;
        }
        previous
    }
}

impl GraphNode for ProbeNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl PoseNode for ProbeNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        self.passthrough.initialize(ctx, initial_time);
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        self.passthrough.shutdown(ctx);
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        let branch_state = self.enter_branch(ctx);
        let result = self.passthrough.update_child(ctx);
        ctx.branch_state = branch_state;
        self.delta_times_after_child.push(ctx.delta_time);
        result
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        let branch_state = self.enter_branch(ctx);
        let result = self.passthrough.update_child_synchronized(ctx, update_range);
        ctx.branch_state = branch_state;
        self.delta_times_after_child.push(ctx.delta_time);
        result
    }

    fn timing(&self) -> PoseNodeTiming {
        self.passthrough.timing()
    }

    fn refresh_from_children(&mut self, ctx: &mut GraphContext) {
        self.passthrough.refresh(ctx);
    }

    fn is_valid(&self) -> bool {
        self.passthrough.is_valid()
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        self.passthrough.sync_track()
    }
}

// --- Conduit probe
// ----------------------------------------------------------------------------------------

/// Plays a source state and evaluates a transition condition compiled inside that state's
/// conduit.
#[derive(Debug)]
pub struct ConduitProbeToolsNode {
    pub base: ToolsNodeBase,
    pub transition_duration: f32,
}

impl ConduitProbeToolsNode {
    pub const IN_STATE: usize = 0;
    pub const IN_CONDITION: usize = 1;

    pub fn new(transition_duration: f32) -> Self {
        Self {
            base: ToolsNodeBase::new("Conduit Probe")
                .with_input("State", GraphValueType::Pose)
                .with_input("Condition", GraphValueType::Bool),
            transition_duration,
        }
    }
}

impl ToolsNode for ConduitProbeToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Conduit Probe"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            let state = ctx.compile_required_input(Self::IN_STATE)?;
            ctx.begin_conduit_compilation(state, self.transition_duration);
            let condition = ctx.compile_required_input(Self::IN_CONDITION);
            ctx.end_conduit_compilation();

            Ok(ConduitProbeDefinition {
                node_index: NodeIndex::INVALID,
                passthrough: PassthroughDefinition {
                    child_node_index: state,
                },
                condition_node_index: condition?,
            })
        })
    }
}

#[derive(Debug)]
pub struct ConduitProbeDefinition {
    pub node_index: NodeIndex,
    pub passthrough: PassthroughDefinition,
    pub condition_node_index: NodeIndex,
}

impl NodeDefinition for ConduitProbeDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "ConduitProbe"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![
            self.passthrough.child_node_index,
            self.condition_node_index,
        ]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(ConduitProbeNode {
            base: NodeBase::new(self.node_index),
            passthrough: PassthroughNode::instantiate(&self.passthrough, ctx)?,
            condition: ctx.value_node_ptr(self.condition_node_index)?,
            conditions: Vec::new(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct ConduitProbeNode {
    base: NodeBase,
    passthrough: PassthroughNode,
    condition: ValueNodePtr<bool>,
    pub conditions: Vec<bool>,
}

impl GraphNode for ConduitProbeNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl PoseNode for ConduitProbeNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        self.passthrough.initialize(ctx, initial_time);
        ctx.initialize_value(self.condition);
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        ctx.shutdown_value(self.condition);
        self.passthrough.shutdown(ctx);
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        let result = self.passthrough.update_child(ctx);
        let condition = ctx.get_value(self.condition);
        self.conditions.push(condition);
        result
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        let result = self.passthrough.update_child_synchronized(ctx, update_range);
        let condition = ctx.get_value(self.condition);
        self.conditions.push(condition);
        result
    }

    fn timing(&self) -> PoseNodeTiming {
        self.passthrough.timing()
    }

    fn refresh_from_children(&mut self, ctx: &mut GraphContext) {
        self.passthrough.refresh(ctx);
    }

    fn is_valid(&self) -> bool {
        self.passthrough.is_valid()
    }
}
