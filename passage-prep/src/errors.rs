//! Unified error type for the passage preparation stage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, tokenizing or chunking documents.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The corpus folder holds no supported document at all.
    #[error("no source documents found in {}", .0.display())]
    CorpusEmpty(PathBuf),

    /// Window size / overlap combination is unusable.
    #[error("invalid chunking config: {0}")]
    ChunkingConfig(String),

    /// Two chunks of one corpus resolved to the same id.
    #[error("duplicate chunk id `{0}` (two documents share a file name?)")]
    DuplicateChunkId(String),

    /// Tokenizer failed to load, encode or decode.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// A PDF could not be opened or parsed.
    #[error("pdf error in {path}: {reason}")]
    Pdf { path: String, reason: String },

    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal errors.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
