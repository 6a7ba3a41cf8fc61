use std::sync::Arc;

use crate::{
    animation_clip::AnimationClip,
    animation_node::{NodeArena, PoseNodePtr, RuntimeNode, ValueNodePtr},
    definition::DefinitionArray,
    edge_data::{GraphValue, GraphValueKind, GraphValueType},
    errors::{GraphError, GraphResult},
    ids::{NodeIndex, ResourceSlot},
    resources::{GraphResource, RagdollDefinition},
};

/// Handed to [`NodeDefinition::instantiate_node`](crate::definition::NodeDefinition) while an
/// instance is being built.
///
/// Definitions are instantiated in slot order, so every index a definition references must
/// already have a runtime node. Resolving an index checks that, plus the role and value type
/// of the target node, and produces a typed handle.
pub struct InstantiationContext<'a> {
    definitions: &'a DefinitionArray,
    nodes: &'a NodeArena,
    resources: &'a [Option<GraphResource>],
    current: NodeIndex,
}

impl<'a> InstantiationContext<'a> {
    pub(crate) fn new(
        definitions: &'a DefinitionArray,
        nodes: &'a NodeArena,
        resources: &'a [Option<GraphResource>],
        current: NodeIndex,
    ) -> Self {
        Self {
            definitions,
            nodes,
            resources,
            current,
        }
    }

    /// Slot of the definition being instantiated.
    pub fn node_index(&self) -> NodeIndex {
        self.current
    }

    fn resolve(&self, index: NodeIndex) -> GraphResult<&RuntimeNode> {
        let in_bounds = index
            .as_usize()
            .is_some_and(|i| i < self.definitions.len());
        if !in_bounds {
            return Err(GraphError::DanglingNodeReference {
                node: self.current,
                referenced: index,
            });
        }
        if index >= self.current {
            return Err(GraphError::ForwardNodeReference {
                node: self.current,
                referenced: index,
            });
        }

        self.nodes
            .get(index)
            .ok_or(GraphError::ForwardNodeReference {
                node: self.current,
                referenced: index,
            })
    }

    pub fn pose_node_ptr(&self, index: NodeIndex) -> GraphResult<PoseNodePtr> {
        match self.resolve(index)? {
            RuntimeNode::Pose(_) => Ok(PoseNodePtr::new(index)),
            RuntimeNode::Value(node) => Err(GraphError::MismatchedNodeType {
                index,
                expected: GraphValueType::Pose,
                found: node.value_type(),
            }),
        }
    }

    /// Like [`Self::pose_node_ptr`], but the target must play an animation clip directly.
    pub fn clip_reference_node_ptr(&self, index: NodeIndex) -> GraphResult<PoseNodePtr> {
        let ptr = self.pose_node_ptr(index)?;
        if self.nodes.pose(ptr).is_clip_reference() {
            Ok(ptr)
        } else {
            Err(GraphError::NotAClipReference(index))
        }
    }

    pub fn value_node_ptr<T: GraphValueKind>(&self, index: NodeIndex) -> GraphResult<ValueNodePtr<T>> {
        let found = self.resolve(index)?.output_type();
        if found == T::VALUE_TYPE {
            Ok(ValueNodePtr::new(index))
        } else {
            Err(GraphError::MismatchedNodeType {
                index,
                expected: T::VALUE_TYPE,
                found,
            })
        }
    }

    /// Value handle for a type only known at runtime, read through
    /// [`GraphContext::get_graph_value`](crate::context::GraphContext::get_graph_value).
    pub fn dynamic_value_node_ptr(
        &self,
        index: NodeIndex,
        expected: GraphValueType,
    ) -> GraphResult<ValueNodePtr<GraphValue>> {
        let found = self.resolve(index)?.output_type();
        if found == expected && !expected.is_pose() {
            Ok(ValueNodePtr::new(index))
        } else {
            Err(GraphError::MismatchedNodeType {
                index,
                expected,
                found,
            })
        }
    }

    /// Resolves an optional reference; [`NodeIndex::INVALID`] means "not connected".
    pub fn optional_value_node_ptr<T: GraphValueKind>(
        &self,
        index: NodeIndex,
    ) -> GraphResult<Option<ValueNodePtr<T>>> {
        if index.is_valid() {
            self.value_node_ptr(index).map(Some)
        } else {
            Ok(None)
        }
    }

    /// The resource registered at `slot`, or `None` if the data set did not provide it.
    pub fn resource(&self, slot: ResourceSlot) -> GraphResult<Option<&'a GraphResource>> {
        slot.as_usize()
            .and_then(|i| self.resources.get(i))
            .map(Option::as_ref)
            .ok_or(GraphError::InvalidResourceSlot(slot))
    }

    pub fn animation_clip(&self, slot: ResourceSlot) -> GraphResult<Option<Arc<AnimationClip>>> {
        match self.resource(slot)? {
            None => Ok(None),
            Some(GraphResource::AnimationClip(clip)) => Ok(Some(clip.clone())),
            Some(_) => Err(GraphError::MismatchedResourceType {
                slot,
                expected: "AnimationClip".into(),
            }),
        }
    }

    pub fn ragdoll_definition(
        &self,
        slot: ResourceSlot,
    ) -> GraphResult<Option<Arc<RagdollDefinition>>> {
        match self.resource(slot)? {
            None => Ok(None),
            Some(GraphResource::RagdollDefinition(ragdoll)) => Ok(Some(ragdoll.clone())),
            Some(_) => Err(GraphError::MismatchedResourceType {
                slot,
                expected: "RagdollDefinition".into(),
            }),
        }
    }
}
