use thiserror::Error;

use crate::{compilation::CompilationLogEntry, ids::VariationId};

/// Reason a single authored node failed to compile.
///
/// These are logged against the node by the compilation context, which then hands
/// [`NodeIndex::INVALID`](crate::ids::NodeIndex::INVALID) back to the caller.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompilationError {
    #[error("Disconnected input pin '{pin}'!")]
    DisconnectedInputPin { pin: String },
    #[error("Failed to compile the node connected to '{pin}'")]
    InputCompilationFailed { pin: String },
    #[error("For {feature} support, you need both '{first}' and '{second}' set.")]
    JointPresence {
        feature: &'static str,
        first: String,
        second: String,
    },
    #[error("Invalid {0}")]
    InvalidIdentifier(&'static str),
    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
    #[error("No data is available for variation '{0}' or any of its parents")]
    MissingVariationData(VariationId),
    #[error("Node is part of a dependency cycle")]
    CyclicDependency,
    #[error("Too many nodes: the definition array is addressed by 16-bit indices")]
    TooManyDefinitions,
    #[error("Too many resources: resource slots are addressed by 16-bit indices")]
    TooManyResources,
    #[error("This node can only be compiled inside a transition conduit")]
    MissingConduit,
}

/// A failed compilation pass, with everything that was logged during it.
#[derive(Debug, Error, Clone)]
#[error("failed to compile animation graph ({} log entries)", .log.len())]
pub struct CompilationFailure {
    pub log: Vec<CompilationLogEntry>,
}

impl CompilationFailure {
    pub fn errors(&self) -> impl Iterator<Item = &CompilationLogEntry> {
        self.log.iter().filter(|entry| entry.is_error())
    }
}
