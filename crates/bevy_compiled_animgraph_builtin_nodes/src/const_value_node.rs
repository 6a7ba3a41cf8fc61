use std::any::Any;

use bevy::reflect::Reflect;
use bevy_compiled_animgraph_core::{
    animation_node::{GraphNode, NodeBase, RuntimeNode, ValueNode},
    compilation::{GraphCompilationContext, ToolsNode, ToolsNodeBase},
    context::GraphContext,
    definition::NodeDefinition,
    edge_data::{GraphValue, GraphValueType},
    errors::GraphResult,
    ids::NodeIndex,
    instantiation::InstantiationContext,
};
use serde::{Deserialize, Serialize};

/// Literal value of any non-pose type.
#[derive(Debug, Clone)]
pub struct ConstValueToolsNode {
    pub base: ToolsNodeBase,
    pub value: GraphValue,
}

impl ConstValueToolsNode {
    pub fn new(value: impl Into<GraphValue>) -> Self {
        let value = value.into();
        Self {
            base: ToolsNodeBase::new(value.value_type().name()),
            value,
        }
    }
}

impl ToolsNode for ConstValueToolsNode {
    fn base(&self) -> &ToolsNodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        match self.value.value_type() {
            GraphValueType::Bool => "Const Bool",
            GraphValueType::Id => "Const ID",
            GraphValueType::Int => "Const Int",
            GraphValueType::Float => "Const Float",
            GraphValueType::Vector => "Const Vector",
            GraphValueType::Target => "Const Target",
            GraphValueType::Pose => "Const",
        }
    }

    fn category(&self) -> &'static str {
        "Values"
    }

    fn output_type(&self) -> GraphValueType {
        self.value.value_type()
    }

    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex {
        ctx.get_definition(self, |_| {
            Ok(ConstValueDefinition {
                node_index: NodeIndex::INVALID,
                value: self.value.clone(),
            })
        })
    }
}

#[derive(Reflect, Debug, Clone, Serialize, Deserialize)]
pub struct ConstValueDefinition {
    pub node_index: NodeIndex,
    pub value: GraphValue,
}

impl NodeDefinition for ConstValueDefinition {
    fn node_index(&self) -> NodeIndex {
        self.node_index
    }

    fn set_node_index(&mut self, index: NodeIndex) {
        self.node_index = index;
    }

    fn kind_name(&self) -> &'static str {
        "ConstValue"
    }

    fn referenced_indices(&self) -> Vec<NodeIndex> {
        Vec::new()
    }

    fn instantiate_node(&self, _: &InstantiationContext) -> GraphResult<RuntimeNode> {
        Ok(RuntimeNode::value(ConstValueNode {
            base: NodeBase::new(self.node_index),
            value: self.value.clone(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct ConstValueNode {
    base: NodeBase,
    value: GraphValue,
}

impl GraphNode for ConstValueNode {
    fn node_base(&self) -> &NodeBase {
        &self.base
    }

    fn node_base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }
}

impl ValueNode for ConstValueNode {
    fn value_type(&self) -> GraphValueType {
        self.value.value_type()
    }

    fn get_value(&mut self, _: &mut GraphContext) -> GraphValue {
        self.value.clone()
    }
}
