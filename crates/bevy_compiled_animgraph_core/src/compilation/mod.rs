mod compiler;
mod context;
mod tools_graph;
mod variation;

pub use compiler::*;
pub use context::*;
pub use tools_graph::*;
pub use variation::*;

use std::fmt::Debug;

use crate::{
    edge_data::GraphValueType,
    ids::{NodeIndex, ToolsNodeId},
};

#[derive(Clone, Debug, PartialEq)]
pub struct InputPin {
    pub name: String,
    pub value_type: GraphValueType,
}

/// Identity and pin layout of an authored node. Every authored node has exactly one output.
#[derive(Clone, Debug)]
pub struct ToolsNodeBase {
    pub id: ToolsNodeId,
    pub name: String,
    pub inputs: Vec<InputPin>,
}

impl ToolsNodeBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ToolsNodeId::new_random(),
            name: name.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value_type: GraphValueType) -> Self {
        self.add_input(name, value_type);
        self
    }

    pub fn add_input(&mut self, name: impl Into<String>, value_type: GraphValueType) -> usize {
        self.inputs.push(InputPin {
            name: name.into(),
            value_type,
        });
        self.inputs.len() - 1
    }

    pub fn num_input_pins(&self) -> usize {
        self.inputs.len()
    }

    pub fn pin_name(&self, pin: usize) -> &str {
        self.inputs.get(pin).map_or("<unknown>", |p| p.name.as_str())
    }
}

/// A node as authored in the editable graph. Compiling it produces a definition in the
/// compilation context's definition array.
pub trait ToolsNode: Debug + Send + Sync + 'static {
    fn base(&self) -> &ToolsNodeBase;

    fn type_name(&self) -> &'static str;

    fn category(&self) -> &'static str {
        "Misc"
    }

    fn output_type(&self) -> GraphValueType;

    /// Nodes that play exactly one animation clip. Some inputs only accept these.
    fn is_animation_clip_reference_node(&self) -> bool {
        false
    }

    /// Extra constraint on what may be connected to `pin`, on top of the type check.
    #[allow(unused_variables)]
    fn is_valid_connection(&self, pin: usize, source: &dyn ToolsNode) -> bool {
        true
    }

    /// Returns the slot of this node's definition, or [`NodeIndex::INVALID`] on failure.
    fn compile(&self, ctx: &mut GraphCompilationContext) -> NodeIndex;

    fn id(&self) -> ToolsNodeId {
        self.base().id
    }

    fn name(&self) -> &str {
        &self.base().name
    }
}

#[cfg(test)]
mod tests;
