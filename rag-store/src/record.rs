//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Provenance of a stored passage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Document file name.
    pub source: String,
    /// Document locator.
    pub path: String,
    /// 1-based page number.
    pub page: u32,
}

/// A passage to be written: embedded by the store, keyed by `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexItem {
    /// Chunk id, unique within a collection.
    pub id: String,
    pub text: String,
    pub metadata: PassageMetadata,
}

/// An [`IndexItem`] with its embedding, as handed to a [`crate::VectorIndex`].
#[derive(Clone, Debug, PartialEq)]
pub struct VectorPoint {
    pub item: IndexItem,
    pub vector: Vec<f32>,
}

/// A single retrieval hit. Hits are returned most-similar first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub chunk_id: String,
    pub text: String,
    pub metadata: PassageMetadata,
    /// Backend similarity score (higher is closer).
    pub score: f32,
}

/// Result of deleting a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Nothing to delete; not an error.
    Absent,
}
