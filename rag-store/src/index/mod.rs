//! Vector index seam.
//!
//! A [`VectorIndex`] stores already-embedded points in named collections and
//! answers nearest-neighbor queries. Embedding is the caller's concern
//! ([`crate::RagStore`] owns it on both the write and the query path).

pub mod memory;

use futures::future::BoxFuture;

use crate::config::VectorSpace;
use crate::errors::RagError;
use crate::record::{DeleteOutcome, RetrievalHit, VectorPoint};

pub use memory::MemoryIndex;

pub trait VectorIndex: Send + Sync {
    fn exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool, RagError>>;

    /// Number of points in an existing collection.
    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<u64, RagError>>;

    /// Creates a collection; creating an existing one is a no-op.
    fn create<'a>(
        &'a self,
        collection: &'a str,
        space: VectorSpace,
    ) -> BoxFuture<'a, Result<(), RagError>>;

    /// Drops a collection. A missing collection yields [`DeleteOutcome::Absent`].
    fn delete<'a>(&'a self, collection: &'a str)
    -> BoxFuture<'a, Result<DeleteOutcome, RagError>>;

    /// Inserts or replaces points by id; returns the number written.
    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'a, Result<usize, RagError>>;

    /// At most `top_k` hits, most similar first.
    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<RetrievalHit>, RagError>>;
}
