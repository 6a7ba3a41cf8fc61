use std::any::Any;

use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use bevy_compiled_animgraph_core::{
    animation_node::{GraphNode, NodeBase, PoseNodePtr, RuntimeNode, ValueNode, ValueNodePtr},
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::{GraphValue, GraphValueType},
    errors::{GraphResult, RecordingError},
    ids::NodeIndex,
    instantiation::InstantiationContext,
    recording::{GraphStateReader, GraphStateRecorder},
};
use serde::{Deserialize, Serialize};

/// What the comparand is compared against.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Default)]
pub enum TimeComparisonType {
    /// Normalized playback position of the source state
    PercentageThroughState,
    /// Normalized position inside the source state's current sync event
    PercentageThroughSyncEvent,
    /// Seconds since the condition became active
    #[default]
    ElapsedTime,
}

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[reflect(Default)]
pub enum TimeComparisonOperator {
    #[default]
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl TimeComparisonOperator {
    pub fn compare(self, value: f32, comparand: f32) -> bool {
        match self {
            TimeComparisonOperator::LessThan => value < comparand,
            TimeComparisonOperator::LessThanEqual => value <= comparand,
            TimeComparisonOperator::GreaterThan => value > comparand,
            TimeComparisonOperator::GreaterThanEqual => value >= comparand,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TimeComparisonOperator::LessThan => "<",
            TimeComparisonOperator::LessThanEqual => "<=",
            TimeComparisonOperator::GreaterThan => ">",
            TimeComparisonOperator::GreaterThanEqual => ">=",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeConditionToolsNode {
    pub base: ToolsNodeBase,
    pub comparand: f32,
    pub comparison_type: TimeComparisonType,
    pub operator: TimeComparisonOperator,
}

impl TimeConditionToolsNode {
    /// Overrides the literal comparand when connected.
    pub const IN_COMPARAND: usize = 0;

    pub fn new(
        comparison_type: TimeComparisonType,
        operator: TimeComparisonOperator,
        comparand: f32,
    ) -> Self {
        Self {
            base: ToolsNodeBase::new("Time Condition")
                .with_input("Comparand", GraphValueType::Float),
            comparand,
            comparison_type,
            operator,
        }
    }
}

impl ToolsNode for TimeConditionToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "Time Condition"
    }

    fn category(&self) -> &'static str {
        "Transitions"
    }

    fn output_type(&self) -> GraphValueType {
        GraphValueType::Bool
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |ctx| {
            let conduit = ctx.conduit()?;
            Ok(TimeConditionDefinition {
                node_index: NodeIndex::INVALID,
                source_state_node_index: conduit.source_state_node_index,
                comparand_value_node_index: ctx.compile_optional_input(Self::IN_COMPARAND)?,
                comparand: self.comparand,
                comparison_type: self.comparison_type,
                operator: self.operator,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct TimeConditionDefinition {
    pub node_index: NodeIndex,
    pub source_state_node_index: NodeIndex,
    pub comparand_value_node_index: NodeIndex,
    pub comparand: f32,
    pub comparison_type: TimeComparisonType,
    pub operator: TimeComparisonOperator,
}

impl NodeDefinition for TimeConditionDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "TimeCondition"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![self.source_state_node_index, self.comparand_value_node_index]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::value(TimeConditionNode {
            base: NodeBase::new(self.node_index),
            source_state: ctx.pose_node_ptr(self.source_state_node_index)?,
            comparand_value: ctx.optional_value_node_ptr(self.comparand_value_node_index)?,
            comparand: self.comparand,
            comparison_type: self.comparison_type,
            operator: self.operator,
            elapsed_time: 0.,
            last_update_id: 0,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct TimeConditionNode {
    base: NodeBase,
    source_state: PoseNodePtr,
    comparand_value: Option<ValueNodePtr<f32>>,
    comparand: f32,
    comparison_type: TimeComparisonType,
    operator: TimeComparisonOperator,
    elapsed_time: f32,
    last_update_id: u64,
}

impl TimeConditionNode {
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Counts each frame once however many times the condition is read in it.
    fn accumulate_elapsed_time(&mut self, ctx: &GraphContext) {
        if ctx.update_id != self.last_update_id {
            self.last_update_id = ctx.update_id;
            self.elapsed_time += ctx.delta_time;
        }
    }
}

impl GraphNode for TimeConditionNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn record_graph_state(&self, recorder: &mut GraphStateRecorder) -> Result<(), RecordingError> {
        recorder.write(&self.elapsed_time)?;
        recorder.write(&self.last_update_id)
    }

    fn restore_graph_state(&mut self, reader: &mut GraphStateReader) -> Result<(), RecordingError> {
        self.elapsed_time = reader.read()?;
        self.last_update_id = reader.read()?;
        Ok(())
    }
}

impl ValueNode for TimeConditionNode {
    fn value_type(&self) -> GraphValueType {
        GraphValueType::Bool
    }

    fn initialize_internal(&mut self, ctx: &mut GraphContext) {
        if let Some(comparand) = self.comparand_value {
            ctx.initialize_value(comparand);
        }
        self.elapsed_time = 0.;
        self.last_update_id = ctx.update_id;
    }

    fn shutdown_internal(&mut self, ctx: &mut GraphContext) {
        if let Some(comparand) = self.comparand_value {
            ctx.shutdown_value(comparand);
        }
    }

    fn get_value(&mut self, ctx: &mut GraphContext) -> GraphValue {
        self.accumulate_elapsed_time(ctx);

        let comparand = match self.comparand_value {
            Some(comparand) => ctx.get_value(comparand),
            None => self.comparand,
        };

        let value = match self.comparison_type {
            TimeComparisonType::PercentageThroughState => {
                ctx.pose_timing(self.source_state).current_time
            }
            TimeComparisonType::PercentageThroughSyncEvent => {
                let state = ctx.pose_node(self.source_state);
                state
                    .sync_track()
                    .get_time(state.timing().current_time)
                    .percentage_through
            }
            TimeComparisonType::ElapsedTime => self.elapsed_time,
        };

        GraphValue::Bool(self.operator.compare(value, comparand))
    }
}

#[cfg(test)]
mod tests {
    use bevy_compiled_animgraph_core::{
        animation_clip::AnimationClip,
        ids::StringId,
        instance::GraphInstance,
        sync_track::{SyncTrack, SyncTrackTime},
    };

    use super::*;
    use crate::{
        clip_node::AnimationClipToolsNode,
        const_value_node::ConstValueToolsNode,
        test_utils::{ConduitProbeNode, ConduitProbeToolsNode, TestGraph},
    };

    fn clip() -> AnimationClip {
        AnimationClip::new(2.).with_sync_track(SyncTrack::from_markers([
            (StringId::from("left"), 0.),
            (StringId::from("right"), 0.5),
        ]))
    }

    fn time_condition_graph(
        condition: TimeConditionToolsNode,
        comparand: Option<f32>,
    ) -> (GraphInstance, NodeIndex) {
        let mut test = TestGraph::new().with_clip("clips/walk", clip());
        let state = test.add(AnimationClipToolsNode::new("clips/walk"));
        let condition = test.add(condition);
        let probe = test.add(ConduitProbeToolsNode::new(0.2));
        test.connect(state, probe, ConduitProbeToolsNode::IN_STATE);
        test.connect(condition, probe, ConduitProbeToolsNode::IN_CONDITION);
        if let Some(comparand) = comparand {
            let value = test.add(ConstValueToolsNode::new(comparand));
            test.connect(value, condition, TimeConditionToolsNode::IN_COMPARAND);
        }

        let probe_index = NodeIndex(if comparand.is_some() { 3 } else { 2 });
        let mut instance = test.instantiate(probe);
        instance.initialize(SyncTrackTime::default());
        (instance, probe_index)
    }

    fn run(
        instance: &mut GraphInstance,
        probe: NodeIndex,
        delta_time: f32,
        frames: usize,
    ) -> Vec<bool> {
        for _ in 0..frames {
            instance.update(delta_time);
        }
        instance
            .node_as::<ConduitProbeNode>(probe)
            .unwrap()
            .conditions
            .clone()
    }

    #[test]
    fn elapsed_time_accumulates_per_frame() {
        let (mut instance, probe) = time_condition_graph(
            TimeConditionToolsNode::new(
                TimeComparisonType::ElapsedTime,
                TimeComparisonOperator::GreaterThan,
                0.25,
            ),
            None,
        );
        assert_eq!(run(&mut instance, probe, 0.1, 3), [false, false, true]);
    }

    #[test]
    fn percentage_through_state() {
        let (mut instance, probe) = time_condition_graph(
            TimeConditionToolsNode::new(
                TimeComparisonType::PercentageThroughState,
                TimeComparisonOperator::GreaterThanEqual,
                0.5,
            ),
            None,
        );
        assert_eq!(run(&mut instance, probe, 0.5, 2), [false, true]);
    }

    #[test]
    fn percentage_through_sync_event() {
        let (mut instance, probe) = time_condition_graph(
            TimeConditionToolsNode::new(
                TimeComparisonType::PercentageThroughSyncEvent,
                TimeComparisonOperator::GreaterThanEqual,
                0.5,
            ),
            None,
        );
        // 0.25 is half way through "left", 0.5 is the start of "right"
        assert_eq!(run(&mut instance, probe, 0.5, 2), [true, false]);
    }

    #[test]
    fn connected_comparand_overrides_literal() {
        let (mut instance, probe) = time_condition_graph(
            TimeConditionToolsNode::new(
                TimeComparisonType::ElapsedTime,
                TimeComparisonOperator::LessThanEqual,
                10.,
            ),
            Some(0.15),
        );
        assert_eq!(run(&mut instance, probe, 0.1, 2), [true, false]);
    }

    #[test]
    fn operators_compare_as_named() {
        use TimeComparisonOperator::*;
        assert!(LessThan.compare(1., 2.));
        assert!(!LessThan.compare(2., 2.));
        assert!(LessThanEqual.compare(2., 2.));
        assert!(GreaterThan.compare(3., 2.));
        assert!(!GreaterThan.compare(2., 2.));
        assert!(GreaterThanEqual.compare(2., 2.));
        assert_eq!(GreaterThanEqual.symbol(), ">=");
    }
}
