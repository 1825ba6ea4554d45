//! Typed error for the contextor crate.
//!
//! Lower-level errors are mapped by variant, so callers can match on the
//! pipeline-level kind without knowing which crate raised it.

use std::path::PathBuf;

use passage_prep::PrepError;
use rag_store::RagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// No source documents at all; nothing was mutated.
    #[error("no source documents found in {}", .0.display())]
    CorpusEmpty(PathBuf),

    /// Window/overlap combination is unusable.
    #[error("invalid chunking config: {0}")]
    ChunkingConfig(String),

    /// Two chunks resolved to the same id.
    #[error("duplicate chunk id `{0}`")]
    DuplicateChunkId(String),

    /// Tokenizer could not be loaded or failed to encode/decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// A document could not be parsed.
    #[error("document error in {path}: {reason}")]
    Document { path: String, reason: String },

    /// Embedding failed (network, auth, quota, timeout, pairing, size).
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// Answer generation failed; retrieved hits remain valid.
    #[error("generation provider error: {0}")]
    GenerationProvider(String),

    /// Vector store unreachable or a collection operation failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// `top_k` must be at least 1.
    #[error("top_k must be at least 1")]
    InvalidTopK,

    /// Blank question.
    #[error("query is empty")]
    EmptyQuery,

    /// Handle predates a store-mutating index run.
    #[error("collection handle is stale (epoch {handle}, current {current}); reacquire it")]
    StaleHandle { handle: u64, current: u64 },

    /// Environment parsing/validation.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem errors (documents, manifest).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PrepError> for ContextorError {
    fn from(e: PrepError) -> Self {
        match e {
            PrepError::CorpusEmpty(p) => Self::CorpusEmpty(p),
            PrepError::ChunkingConfig(m) => Self::ChunkingConfig(m),
            PrepError::DuplicateChunkId(id) => Self::DuplicateChunkId(id),
            PrepError::Tokenizer(m) => Self::Tokenizer(m),
            PrepError::Pdf { path, reason } => Self::Document { path, reason },
            PrepError::Io(e) => Self::Io(e),
            PrepError::Walk(e) => Self::Io(e.into()),
        }
    }
}

impl From<RagError> for ContextorError {
    fn from(e: RagError) -> Self {
        match e {
            RagError::Config(m) => Self::Config(m),
            e if e.is_embedding() => Self::EmbeddingProvider(e.to_string()),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_errors_map_by_kind() {
        let e: ContextorError = RagError::EmbeddingPairing("missing index 2".into()).into();
        assert!(matches!(e, ContextorError::EmbeddingProvider(_)));

        let e: ContextorError = RagError::VectorSizeMismatch { got: 3, want: 4 }.into();
        assert!(matches!(e, ContextorError::EmbeddingProvider(_)));

        let e: ContextorError = RagError::StoreUnavailable("refused".into()).into();
        assert!(matches!(e, ContextorError::StoreUnavailable(m) if m.contains("refused")));
    }

    #[test]
    fn prep_errors_map_by_kind() {
        let e: ContextorError = PrepError::CorpusEmpty("docs".into()).into();
        assert!(matches!(e, ContextorError::CorpusEmpty(_)));

        let e: ContextorError = PrepError::DuplicateChunkId("a:p1:c0".into()).into();
        assert!(matches!(e, ContextorError::DuplicateChunkId(id) if id == "a:p1:c0"));
    }
}
