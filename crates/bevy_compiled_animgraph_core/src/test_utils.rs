//! Minimal nodes for exercising the compiler and the runtime without the builtin catalog.

use std::{any::Any, sync::Arc};

use crate::{
    animation_node::{
        GraphNode, NodeBase, PoseNode, PoseNodePtr, PoseNodeResult, PoseNodeTiming,
        RuntimeNode, ValueNode, ValueNodePtr,
    },
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::{
        GraphValue, GraphValueType,
        events::{SampledEvent, SampledEventRange},
    },
    errors::{CompilationError, GraphResult, RecordingError},
    ids::{NodeIndex, StringId},
    instantiation::InstantiationContext,
    recording::{GraphStateReader, GraphStateRecorder},
    sync_track::{SyncTrack, SyncTrackTime, SyncTrackTimeRange},
};

// --- Leaf
// ----------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct LeafTools {
    pub base: ToolsNodeBase,
    pub duration: f32,
}

impl LeafTools {
    pub fn new(duration: f32) -> Self {
        Self {
            base: ToolsNodeBase::new("Leaf"),
            duration,
        }
    }
}

impl ToolsNode for LeafTools {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Leaf"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |_| {
            if self.duration < 0. {
                return Err(CompilationError::InvalidParameter {
                    field: "duration",
                    reason: "must not be negative".into(),
                });
            }
            Ok(LeafDefinition {
                node_index: NodeIndex::INVALID,
                duration: self.duration,
            })
        })
    }
}

#[derive(Debug)]
pub struct LeafDefinition {
    pub node_index: NodeIndex,
    pub duration: f32,
}

impl NodeDefinition for LeafDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "Leaf"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        Vec::new()
    }

    fn instantiate_node(&self, _: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(LeafNode {
            base: NodeBase::new(self.node_index),
            timing: PoseNodeTiming {
                duration: self.duration,
                ..Default::default()
            },
            initialize_calls: 0,
            observed_delta_times: Vec::new(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Free-running looping timer that raises one "tick" event per update.
#[derive(Debug)]
pub struct LeafNode {
    pub base: NodeBase,
    pub timing: PoseNodeTiming,
    pub initialize_calls: u32,
    pub observed_delta_times: Vec<f32>,
}

impl GraphNode for LeafNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        recorder.write(&self.timing.current_time)
    }

    fn restore_graph_state(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.timing.current_time = reader.read()?;
        self.timing.previous_time = self.timing.current_time;
        Ok(())
    }
}

impl PoseNode for LeafNode {
    fn initialize_internal(&mut self, _: &mut GraphContext, initial_time: SyncTrackTime) {
        self.initialize_calls += 1;
        self.timing.current_time = initial_time.percentage_through;
        self.timing.previous_time = self.timing.current_time;
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        self.observed_delta_times.push(ctx.delta_time);
        self.timing.previous_time = self.timing.current_time;
        if self.timing.duration > 0. {
            self.timing.current_time =
                (self.timing.current_time + ctx.delta_time / self.timing.duration).fract();
        }

        let index = ctx.sampled_events.push(SampledEvent::instant(
            self.node_index(),
            StringId::from("tick"),
        ));
        PoseNodeResult {
            pose: None,
            sampled_event_range: SampledEventRange::new(index, index + 1),
        }
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        self.timing.previous_time = update_range.start_time.percentage_through;
        self.timing.current_time = update_range.end_time.percentage_through;
        PoseNodeResult::empty(ctx)
    }

    fn timing(&self) -> PoseNodeTiming {
        self.timing
    }

    fn sync_track(&self) -> Arc<SyncTrack> {
        SyncTrack::default_track()
    }
}

// --- Float value
// ----------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct FloatTools {
    pub base: ToolsNodeBase,
    pub value: f32,
}

impl FloatTools {
    pub fn new(value: f32) -> Self {
        Self {
            base: ToolsNodeBase::new("Float"),
            value,
        }
    }
}

impl ToolsNode for FloatTools {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Float"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Float
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |_| {
            Ok(FloatDefinition {
                node_index: NodeIndex::INVALID,
                value: self.value,
            })
        })
    }
}

#[derive(Debug)]
pub struct FloatDefinition {
    pub node_index: NodeIndex,
    pub value: f32,
}

impl NodeDefinition for FloatDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "Float"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        Vec::new()
    }

    fn instantiate_node(&self, _: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::value(FloatNode {
            base: NodeBase::new(self.node_index),
            value: self.value,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct FloatNode {
    pub base: NodeBase,
    pub value: f32,
}

impl GraphNode for FloatNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl ValueNode for FloatNode {
    fn value_type(&self) -> GraphValueType {
        GraphValueType::Float
    }

    fn get_value(&mut self, _: &mut GraphContext) -> GraphValue {
        GraphValue::Float(self.value)
    }
}

// --- Pair: two pose inputs and an optional weight
// ----------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct PairTools {
    pub base: ToolsNodeBase,
}

impl PairTools {
    pub const IN_FIRST: usize = 0;
    pub const IN_SECOND: usize = 1;
    pub const IN_WEIGHT: usize = 2;

    pub fn new() -> Self {
        Self {
            base: ToolsNodeBase::new("Pair")
                .with_input("First", GraphValueType::Pose)
                .with_input("Second", GraphValueType::Pose)
                .with_input("Weight", GraphValueType::Float),
        }
    }
}

impl ToolsNode for PairTools {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Pair"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Pose
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            Ok(PairDefinition {
                node_index: NodeIndex::INVALID,
                first_node_index: ctx.compile_required_input(Self::IN_FIRST)?,
                second_node_index: ctx.compile_required_input(Self::IN_SECOND)?,
                weight_node_index: ctx.compile_optional_input(Self::IN_WEIGHT)?,
            })
        })
    }
}

#[derive(Debug)]
pub struct PairDefinition {
    pub node_index: NodeIndex,
    pub first_node_index: NodeIndex,
    pub second_node_index: NodeIndex,
    pub weight_node_index: NodeIndex,
}

impl NodeDefinition for PairDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "Pair"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![
            self.first_node_index,
            self.second_node_index,
            self.weight_node_index,
        ]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::pose(PairNode {
            base: NodeBase::new(self.node_index),
            first: ctx.pose_node_ptr(self.first_node_index)?,
            second: ctx.pose_node_ptr(self.second_node_index)?,
            weight: ctx.optional_value_node_ptr(self.weight_node_index)?,
            timing: PoseNodeTiming::default(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct PairNode {
    pub base: NodeBase,
    pub first: PoseNodePtr,
    pub second: PoseNodePtr,
    pub weight: Option<ValueNodePtr<f32>>,
    pub timing: PoseNodeTiming,
}

impl GraphNode for PairNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl PoseNode for PairNode {
    fn initialize_internal(&mut self, ctx: &mut GraphContext, initial_time: SyncTrackTime) {
        ctx.initialize_pose(self.first, initial_time);
        ctx.initialize_pose(self.second, initial_time);
        if let Some(weight) = self.weight {
            ctx.initialize_value(weight);
        }
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        ctx.shutdown_pose(self.first);
        ctx.shutdown_pose(self.second);
        if let Some(weight) = self.weight {
            ctx.shutdown_value(weight);
        }
    }

    fn update(&mut self, ctx: &mut GraphContext) -> PoseNodeResult {
        let first = ctx.update_pose(self.first);
        let second = ctx.update_pose(self.second);
        let weight = self.weight.map_or(1., |weight| ctx.get_value(weight));
        self.timing = ctx.pose_timing(self.first);
        self.timing.duration *= weight;

        PoseNodeResult {
            pose: first.pose,
            sampled_event_range: first
                .sampled_event_range
                .combine(second.sampled_event_range),
        }
    }

    fn update_synchronized(
        &mut self,
        ctx: &mut GraphContext,
        update_range: &SyncTrackTimeRange,
    ) -> PoseNodeResult {
        ctx.update_pose_synchronized(self.first, update_range);
        ctx.update_pose_synchronized(self.second, update_range);
        PoseNodeResult::empty(ctx)
    }

    fn timing(&self) -> PoseNodeTiming {
        self.timing
    }
}
