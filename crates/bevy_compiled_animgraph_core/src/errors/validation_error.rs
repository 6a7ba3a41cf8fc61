use thiserror::Error;

use crate::{edge_data::GraphValueType, ids::ToolsNodeId};

/// Rejected edits to an authored graph.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphValidationError {
    #[error("No node with id {0} in the graph")]
    UnknownNode(ToolsNodeId),
    #[error("Node {node} has no input pin {pin}")]
    PinOutOfRange { node: ToolsNodeId, pin: usize },
    #[error("Pin expects {expected:?} but the source node produces {found:?}")]
    InconsistentPinTypes {
        expected: GraphValueType,
        found: GraphValueType,
    },
    #[error("Node {node} does not accept this connection on pin {pin}")]
    RejectedConnection { node: ToolsNodeId, pin: usize },
    #[error("Connecting {source_node} into {target} would create a cycle")]
    WouldCreateCycle {
        source_node: ToolsNodeId,
        target: ToolsNodeId,
    },
}
