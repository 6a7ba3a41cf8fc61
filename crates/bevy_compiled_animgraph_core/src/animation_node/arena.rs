use crate::{
    animation_node::{GraphNode, PoseNode, PoseNodePtr, RuntimeNode, ValueNode},
    errors::{GraphError, GraphResult},
    ids::NodeIndex,
};

/// Storage for every runtime node of an instance, indexed by definition slot.
///
/// A node being updated is temporarily taken out of its slot, so it can be handed the
/// [`GraphContext`](crate::context::GraphContext) (and through it, access to its children)
/// while being mutably borrowed itself.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<RuntimeNode>>,
}

impl NodeArena {
    pub fn with_capacity(num_nodes: usize) -> Self {
        Self {
            slots: (0..num_nodes).map(|_| None).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn insert(&mut self, index: NodeIndex, node: RuntimeNode) -> GraphResult<()> {
        let slot = index
            .as_usize()
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(GraphError::DanglingNodeReference {
                node: index,
                referenced: index,
            })?;
        if slot.is_some() {
            return Err(GraphError::DuplicateNodeSlot(index));
        }
        *slot = Some(node);
        Ok(())
    }

    pub fn get(&self, index: NodeIndex) -> Option<&RuntimeNode> {
        self.slots.get(index.as_usize()?)?.as_ref()
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut RuntimeNode> {
        self.slots.get_mut(index.as_usize()?)?.as_mut()
    }

    pub fn graph_node(&self, index: NodeIndex) -> Option<&dyn GraphNode> {
        self.get(index).map(RuntimeNode::as_graph_node)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&RuntimeNode>> {
        self.slots.iter().map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = Option<&mut RuntimeNode>> {
        self.slots.iter_mut().map(Option::as_mut)
    }

    pub fn pose(&self, ptr: PoseNodePtr) -> &dyn PoseNode {
        match self.get(ptr.index()) {
            Some(RuntimeNode::Pose(node)) => node.as_ref(),
            _ => panic!("pose node {} is not available", ptr.index()),
        }
    }

    pub(crate) fn value(&self, index: NodeIndex) -> &dyn ValueNode {
        match self.get(index) {
            Some(RuntimeNode::Value(node)) => node.as_ref(),
            _ => panic!("value node {index} is not available"),
        }
    }

    pub(crate) fn take_pose(&mut self, ptr: PoseNodePtr) -> Box<dyn PoseNode> {
        match self.take(ptr.index()) {
            RuntimeNode::Pose(node) => node,
            RuntimeNode::Value(_) => panic!("node {} is not a pose node", ptr.index()),
        }
    }

    pub(crate) fn take_value(&mut self, index: NodeIndex) -> Box<dyn ValueNode> {
        match self.take(index) {
            RuntimeNode::Value(node) => node,
            RuntimeNode::Pose(_) => panic!("node {index} is not a value node"),
        }
    }

    pub(crate) fn put_back(&mut self, index: NodeIndex, node: RuntimeNode) {
        if let Some(slot) = index.as_usize().and_then(|i| self.slots.get_mut(i)) {
            *slot = Some(node);
        }
    }

    fn take(&mut self, index: NodeIndex) -> RuntimeNode {
        index
            .as_usize()
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("node {index} is missing or already being updated"))
    }
}
