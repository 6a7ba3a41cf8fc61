use thiserror::Error;

/// Failures of the graph state record/restore protocol.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Failed to encode recorded state: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("Failed to decode recorded state: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("Recording holds {found} nodes but the graph has {expected}")]
    NodeCountMismatch { expected: usize, found: usize },
    #[error("Graph state can only be recorded or restored while the graph is initialized")]
    NotInitialized,
}
