use std::{any::Any, fmt::Debug};

use crate::{
    animation_node::RuntimeNode,
    errors::{CompilationError, GraphError, GraphResult},
    ids::{NodeIndex, ResourceId, VariationId},
    instantiation::InstantiationContext,
};

/// Compiled settings of one node: literal parameters plus the indices of the nodes it reads
/// from. Definitions are immutable once committed and are shared by every instance of the
/// graph.
pub trait NodeDefinition: Any + Debug + Send + Sync {
    fn node_index(&self) -> NodeIndex;

    /// Called by the compilation context when the definition is committed.
    fn set_node_index(&mut self, index: NodeIndex);

    fn kind_name(&self) -> &'static str;

    /// Every node index this definition refers to. Optional references may be
    /// [`NodeIndex::INVALID`].
    fn referenced_indices(&self) -> Vec<NodeIndex>;

    fn instantiate_node(&self, ctx: &InstantiationContext) -> GraphResult<RuntimeNode>;

    fn as_any(&self) -> &dyn Any;
}

/// Index-addressed table of node definitions. Insertion order is commit order, so every
/// definition only refers to slots created before it.
#[derive(Debug, Default)]
pub struct DefinitionArray {
    definitions: Vec<Box<dyn NodeDefinition>>,
}

impl DefinitionArray {
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, index: NodeIndex) -> Option<&dyn NodeDefinition> {
        self.definitions
            .get(index.as_usize()?)
            .map(|definition| definition.as_ref())
    }

    pub fn get_as<T: NodeDefinition>(&self, index: NodeIndex) -> Option<&T> {
        self.get(index)?.as_any().downcast_ref::<T>()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NodeDefinition> {
        self.definitions.iter().map(|definition| definition.as_ref())
    }

    /// Appends a definition at the next free slot and stamps it with that slot.
    pub(crate) fn push(
        &mut self,
        mut definition: Box<dyn NodeDefinition>,
    ) -> Result<NodeIndex, CompilationError> {
        let index = NodeIndex::from_usize(self.definitions.len())
            .ok_or(CompilationError::TooManyDefinitions)?;
        definition.set_node_index(index);
        self.definitions.push(definition);
        Ok(index)
    }

    /// Checks that each definition sits in the slot it claims and only references earlier,
    /// existing slots.
    pub fn validate(&self) -> GraphResult<()> {
        for (slot, definition) in self.definitions.iter().enumerate() {
            let slot = NodeIndex::from_usize(slot).unwrap_or(NodeIndex::INVALID);
            if definition.node_index() != slot {
                return Err(GraphError::MisplacedDefinition {
                    slot,
                    claimed: definition.node_index(),
                });
            }

            for referenced in definition.referenced_indices() {
                if !referenced.is_valid() {
                    continue;
                }
                if referenced.as_usize().is_none_or(|r| r >= self.len()) {
                    return Err(GraphError::DanglingNodeReference {
                        node: slot,
                        referenced,
                    });
                }
                if referenced >= slot {
                    return Err(GraphError::ForwardNodeReference {
                        node: slot,
                        referenced,
                    });
                }
            }
        }

        Ok(())
    }
}

/// The deployable product of compilation.
#[derive(Debug)]
pub struct CompiledGraph {
    pub definitions: DefinitionArray,
    /// Resource ids by slot, as registered during compilation
    pub resources: Vec<ResourceId>,
    pub root_node_index: NodeIndex,
    pub variation_id: VariationId,
}

impl CompiledGraph {
    pub fn num_nodes(&self) -> usize {
        self.definitions.len()
    }

    pub fn root_definition(&self) -> Option<&dyn NodeDefinition> {
        self.definitions.get(self.root_node_index)
    }
}
