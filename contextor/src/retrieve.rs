//! Read-only retrieval against a ready collection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rag_store::{RagStore, RetrievalHit};
use tracing::debug;

use crate::error::ContextorError;
use crate::indexer::{CollectionHandle, check_epoch};

/// Query side of the pipeline. Obtain one from [`crate::Indexer::retriever`].
#[derive(Clone)]
pub struct Retriever {
    store: RagStore,
    collection: String,
    epoch: Arc<AtomicU64>,
}

impl Retriever {
    pub(crate) fn new(store: RagStore, collection: String, epoch: Arc<AtomicU64>) -> Self {
        Self {
            store,
            collection,
            epoch,
        }
    }

    /// Returns at most `top_k` passages, most similar first.
    ///
    /// `top_k` is not clamped here; bounding it is the caller's job.
    ///
    /// # Errors
    /// `InvalidTopK` for 0, `EmptyQuery` for a blank query, `StaleHandle`
    /// when a rebuild happened after `handle` was issued or `handle` names
    /// another collection, and provider/store errors from the query itself.
    pub async fn retrieve(
        &self,
        handle: &CollectionHandle,
        query: &str,
        top_k: u64,
    ) -> Result<Vec<RetrievalHit>, ContextorError> {
        if top_k == 0 {
            return Err(ContextorError::InvalidTopK);
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(ContextorError::EmptyQuery);
        }
        let current = self.epoch.load(Ordering::SeqCst);
        if handle.collection != self.collection {
            return Err(ContextorError::StaleHandle {
                handle: handle.epoch,
                current,
            });
        }
        check_epoch(handle, current)?;

        let hits = self.store.query(&self.collection, query, top_k).await?;
        debug!(
            target: "contextor::retrieve",
            collection = %self.collection,
            top_k,
            hits = hits.len(),
            best = hits.first().map(|h| h.score),
            "retrieved"
        );
        Ok(hits)
    }
}
