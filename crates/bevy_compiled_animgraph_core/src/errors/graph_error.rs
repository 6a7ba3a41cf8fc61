use bevy::prelude::*;
use thiserror::Error;

use crate::{
    edge_data::GraphValueType,
    ids::{NodeIndex, ResourceSlot},
};

/// Errors produced while instantiating a compiled graph or reading values out of it.
///
/// Any of these indicates a defective definition array: a correctly compiled graph never
/// produces them.
#[non_exhaustive]
#[derive(Debug, Error, Reflect, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {node} references {referenced}, which is not part of the definition array")]
    DanglingNodeReference {
        node: NodeIndex,
        referenced: NodeIndex,
    },
    #[error("Node {node} references {referenced}, which has not been instantiated yet")]
    ForwardNodeReference {
        node: NodeIndex,
        referenced: NodeIndex,
    },
    #[error("Node {index} was expected to produce {expected:?}, but it produces {found:?}")]
    MismatchedNodeType {
        index: NodeIndex,
        expected: GraphValueType,
        found: GraphValueType,
    },
    #[error("Node {0} is not an animation clip reference")]
    NotAClipReference(NodeIndex),
    #[error("Definition slot {0} was instantiated twice")]
    DuplicateNodeSlot(NodeIndex),
    #[error("Definition stored at slot {slot} claims to be {claimed}")]
    MisplacedDefinition { slot: NodeIndex, claimed: NodeIndex },
    #[error("The root node {0} is missing or is not a pose node")]
    MissingRootNode(NodeIndex),
    #[error("Resource slot {0:?} was never registered")]
    InvalidResourceSlot(ResourceSlot),
    #[error("Resource slot {slot:?} does not hold a {expected}")]
    MismatchedResourceType {
        slot: ResourceSlot,
        expected: String,
    },
    #[error("Tried to convert to incorrect data type: expected {0}, got {1}")]
    MismatchedDataType(String, String),
}

pub type GraphResult<T> = Result<T, GraphError>;
