use bevy::platform::collections::HashMap;
use indexmap::IndexMap;

use crate::{
    compilation::ToolsNode,
    errors::GraphValidationError,
    ids::ToolsNodeId,
};

/// Editable graph of authored nodes. Each input pin is fed by at most one node's output.
#[derive(Debug, Default)]
pub struct ToolsGraph {
    nodes: IndexMap<ToolsNodeId, Box<dyn ToolsNode>>,
    /// (target node, input pin) -> source node
    connections: HashMap<(ToolsNodeId, usize), ToolsNodeId>,
}

impl ToolsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: impl ToolsNode) -> ToolsNodeId {
        let id = node.id();
        self.nodes.insert(id, Box::new(node));
        id
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(&mut self, id: ToolsNodeId) -> Option<Box<dyn ToolsNode>> {
        let node = self.nodes.shift_remove(&id)?;
        self.connections
            .retain(|(target, _), source| *target != id && *source != id);
        Some(node)
    }

    pub fn node(&self, id: ToolsNodeId) -> Option<&dyn ToolsNode> {
        self.nodes.get(&id).map(|node| node.as_ref())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &dyn ToolsNode> {
        self.nodes.values().map(|node| node.as_ref())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn connected_input_node(&self, target: ToolsNodeId, pin: usize) -> Option<&dyn ToolsNode> {
        self.connections
            .get(&(target, pin))
            .and_then(|source| self.node(*source))
    }

    /// Feeds `pin` of `target` from the output of `source`, replacing any existing connection.
    pub fn connect(
        &mut self,
        source: ToolsNodeId,
        target: ToolsNodeId,
        pin: usize,
    ) -> Result<(), GraphValidationError> {
        let source_node = self
            .node(source)
            .ok_or(GraphValidationError::UnknownNode(source))?;
        let target_node = self
            .node(target)
            .ok_or(GraphValidationError::UnknownNode(target))?;

        let input = target_node
            .base()
            .inputs
            .get(pin)
            .ok_or(GraphValidationError::PinOutOfRange { node: target, pin })?;

        if input.value_type != source_node.output_type() {
            return Err(GraphValidationError::InconsistentPinTypes {
                expected: input.value_type,
                found: source_node.output_type(),
            });
        }

        if !target_node.is_valid_connection(pin, source_node) {
            return Err(GraphValidationError::RejectedConnection { node: target, pin });
        }

        if self.depends_on(source, target) {
            return Err(GraphValidationError::WouldCreateCycle {
                source_node: source,
                target,
            });
        }

        self.connections.insert((target, pin), source);
        Ok(())
    }

    pub fn disconnect(&mut self, target: ToolsNodeId, pin: usize) -> Option<ToolsNodeId> {
        self.connections.remove(&(target, pin))
    }

    /// Whether `node` reads from `dependency`, directly or transitively. A node depends on
    /// itself.
    pub fn depends_on(&self, node: ToolsNodeId, dependency: ToolsNodeId) -> bool {
        let mut stack = vec![node];
        let mut visited = Vec::new();

        while let Some(current) = stack.pop() {
            if current == dependency {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);

            let num_pins = self
                .node(current)
                .map_or(0, |node| node.base().num_input_pins());
            stack.extend(
                (0..num_pins).filter_map(|pin| self.connections.get(&(current, pin)).copied()),
            );
        }

        false
    }
}
