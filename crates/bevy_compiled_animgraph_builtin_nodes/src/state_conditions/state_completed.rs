use std::any::Any;

use bevy::reflect::Reflect;
use bevy_compiled_animgraph_core::{
    animation_node::{GraphNode, NodeBase, PoseNodePtr, RuntimeNode, ValueNode},
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::{GraphValue, GraphValueType},
    errors::GraphResult,
    ids::NodeIndex,
    instantiation::InstantiationContext,
    utils::math::is_near_zero,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct StateCompletedConditionToolsNode {
    pub base: ToolsNodeBase,
}

impl StateCompletedConditionToolsNode {
    pub fn new() -> Self {
        Self {
            base: ToolsNodeBase::new("State Completed"),
        }
    }
}

impl Default for StateCompletedConditionToolsNode {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolsNode for StateCompletedConditionToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "State Completed"
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
            Ok(StateCompletedConditionDefinition {
                node_index: NodeIndex::INVALID,
                source_state_node_index: conduit.source_state_node_index,
                transition_duration: conduit.transition_duration,
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct StateCompletedConditionDefinition {
    pub node_index: NodeIndex,
    pub source_state_node_index: NodeIndex,
    /// Seconds
    pub transition_duration: f32,
}

impl NodeDefinition for StateCompletedConditionDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "StateCompletedCondition"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        vec![self.source_state_node_index]
    }

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::value(StateCompletedConditionNode {
            base: NodeBase::new(self.node_index),
            source_state: ctx.pose_node_ptr(self.source_state_node_index)?,
            transition_duration: self.transition_duration,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// True once the source state has no more than the transition's duration left to play, has
/// looped, or has no duration at all.
#[derive(Debug)]
pub struct StateCompletedConditionNode {
    base: NodeBase,
    source_state: PoseNodePtr,
    transition_duration: f32,
}

impl GraphNode for StateCompletedConditionNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl ValueNode for StateCompletedConditionNode {
    fn value_type(&self) -> GraphValueType {
        GraphValueType::Bool
    }

    fn get_value(&mut self, ctx: &mut GraphContext) -> GraphValue {
        let timing = ctx.pose_timing(self.source_state);
        let completed = if is_near_zero(timing.duration) || timing.loop_count > 0 {
            true
        } else {
            let remaining = (1. - timing.current_time) * timing.duration;
            remaining <= self.transition_duration
        };

        GraphValue::Bool(completed)
    }
}
