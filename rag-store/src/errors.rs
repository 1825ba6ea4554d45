//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The embedding backend failed (network, auth, quota, timeout, decode).
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// Provider output could not be paired one-to-one with the inputs.
    #[error("embedding pairing error: {0}")]
    EmbeddingPairing(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Vector store unreachable or a collection operation failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored point lacks the fields a passage needs.
    #[error("malformed payload for point {point}: {reason}")]
    MalformedPayload { point: String, reason: String },
}

impl RagError {
    /// True for every failure that originates in the embedding path.
    pub fn is_embedding(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingProvider(_)
                | RagError::EmbeddingPairing(_)
                | RagError::VectorSizeMismatch { .. }
        )
    }
}
