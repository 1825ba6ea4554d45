//! Indexing orchestrator.
//!
//! State machine over one collection:
//! - `Uninitialized` (no collection) -> create -> `Empty`
//! - `Empty` -> load, chunk, upsert in storage batches -> `Populated`
//! - `Populated` without rebuild -> no-op, `count > 0` is trusted
//!
//! Documents are loaded and chunked before any store mutation, so a corpus
//! problem (`CorpusEmpty`, `DuplicateChunkId`) never deletes or creates a
//! collection. A provider/store failure mid-population leaves a partial
//! collection; the missing manifest reports it on the next run.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use passage_prep::{Chunk, ChunkingConfig, DocumentLoader, Page, TokenCodec, make_chunks};
use rag_store::{IndexItem, PassageMetadata, RagStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ContextorError;
use crate::manifest::{self, IndexFingerprint, IndexManifest, IndexWarning, ManifestStore};
use crate::progress::Progress;
use crate::retrieve::Retriever;

const PROBE_FALLBACK: &str = "dimension probe";

/// Collection state observed before a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Empty,
    Populated,
}

/// What a run did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexAction {
    /// Populated collection kept as is.
    Reused,
    /// Empty or missing collection filled.
    Populated,
    /// Collection dropped and filled again.
    Rebuilt,
}

/// Caller-held reference to a ready collection.
///
/// Stamped with the epoch of the run that produced it; any later
/// store-mutating run makes it stale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectionHandle {
    pub collection: String,
    pub passages: u64,
    pub epoch: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct IndexReport {
    pub state_before: IndexState,
    pub action: IndexAction,
    pub passages: u64,
    pub warnings: Vec<IndexWarning>,
    pub handle: CollectionHandle,
}

/// Builds and maintains one collection from a documents folder.
#[derive(Clone)]
pub struct Indexer {
    store: RagStore,
    codec: Arc<dyn TokenCodec>,
    loader: Arc<dyn DocumentLoader>,
    docs_dir: PathBuf,
    chunking: ChunkingConfig,
    store_batch: usize,
    collection: String,
    manifests: ManifestStore,
    epoch: Arc<AtomicU64>,
}

/// Everything [`Indexer::new`] needs besides its collaborators.
#[derive(Clone, Debug)]
pub struct IndexerSettings {
    pub docs_dir: PathBuf,
    pub chunking: ChunkingConfig,
    pub store_batch: usize,
    pub collection: String,
    pub manifest_dir: PathBuf,
}

impl Indexer {
    pub fn new(
        store: RagStore,
        codec: Arc<dyn TokenCodec>,
        loader: Arc<dyn DocumentLoader>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            store,
            codec,
            loader,
            docs_dir: settings.docs_dir,
            chunking: settings.chunking,
            store_batch: settings.store_batch.max(1),
            collection: settings.collection,
            manifests: ManifestStore::new(settings.manifest_dir),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Epoch of the last store-mutating run.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Read-only query side sharing this indexer's epoch.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(
            self.store.clone(),
            self.collection.clone(),
            self.epoch.clone(),
        )
    }

    /// Current state of the collection.
    pub async fn state(&self) -> Result<(IndexState, u64), ContextorError> {
        if !self.store.exists(&self.collection).await? {
            return Ok((IndexState::Uninitialized, 0));
        }
        let n = self.store.count(&self.collection).await?;
        let state = if n == 0 {
            IndexState::Empty
        } else {
            IndexState::Populated
        };
        Ok((state, n))
    }

    /// Makes the collection ready and returns a fresh handle.
    ///
    /// # Errors
    /// - `ChunkingConfig` before any provider call
    /// - `CorpusEmpty` / `DuplicateChunkId` with the store untouched
    /// - `EmbeddingProvider` / `StoreUnavailable` mid-population (partial
    ///   collection, no manifest)
    pub async fn ensure_index(
        &self,
        rebuild: bool,
        progress: &dyn Progress,
    ) -> Result<IndexReport, ContextorError> {
        self.chunking.validate()?;

        let (state_before, stored) = self.state().await?;
        info!(
            target: "contextor::index",
            collection = %self.collection,
            state = ?state_before,
            stored,
            rebuild,
            "index run"
        );

        if state_before == IndexState::Populated && !rebuild {
            let warnings = self.check_manifest(stored)?;
            for w in &warnings {
                warn!(target: "contextor::index", collection = %self.collection, "{w}");
            }
            progress.finish("index reused");
            return Ok(IndexReport {
                state_before,
                action: IndexAction::Reused,
                passages: stored,
                warnings,
                handle: self.handle(stored),
            });
        }

        progress.message("loading documents");
        let chunks = self.prepare_chunks().await?;

        // From here on the store is mutated.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.manifests.remove(&self.collection)?;

        let action = if rebuild && state_before != IndexState::Uninitialized {
            let outcome = self.store.delete(&self.collection).await?;
            debug!(target: "contextor::index", ?outcome, "collection dropped");
            IndexAction::Rebuilt
        } else if rebuild {
            IndexAction::Rebuilt
        } else {
            IndexAction::Populated
        };

        let probe = chunks.first().map_or(PROBE_FALLBACK, |c| c.text.as_str());
        self.store.ensure_collection(&self.collection, probe).await?;

        let written = self.write_chunks(chunks, progress).await?;
        let passages = self.store.count(&self.collection).await?;
        if passages != written as u64 {
            warn!(
                target: "contextor::index",
                written,
                passages,
                "stored count differs from passages written"
            );
        }

        self.manifests.save(&IndexManifest {
            collection: self.collection.clone(),
            passages,
            encoding_id: self.codec.encoding_id().to_string(),
            embedding_model: self.store.embedding_model().to_string(),
            chunk_tokens: self.chunking.chunk_tokens,
            overlap: self.chunking.overlap,
            completed_at: Utc::now(),
        })?;

        progress.finish("index ready");
        info!(
            target: "contextor::index",
            collection = %self.collection,
            passages,
            ?action,
            "index populated"
        );

        Ok(IndexReport {
            state_before,
            action,
            passages,
            warnings: Vec::new(),
            handle: self.handle(passages),
        })
    }

    /// Rejects handles issued before the last store-mutating run.
    pub fn check_handle(&self, handle: &CollectionHandle) -> Result<(), ContextorError> {
        check_epoch(handle, self.epoch())
    }

    fn handle(&self, passages: u64) -> CollectionHandle {
        CollectionHandle {
            collection: self.collection.clone(),
            passages,
            epoch: self.epoch(),
        }
    }

    fn check_manifest(&self, stored: u64) -> Result<Vec<IndexWarning>, ContextorError> {
        let current = IndexFingerprint {
            encoding_id: self.codec.encoding_id().to_string(),
            embedding_model: self.store.embedding_model().to_string(),
            chunk_tokens: self.chunking.chunk_tokens,
            overlap: self.chunking.overlap,
        };
        let stored_manifest = self.manifests.load(&self.collection)?;
        Ok(manifest::compare(stored_manifest.as_ref(), stored, &current))
    }

    /// Loads and chunks the whole corpus off the async runtime.
    async fn prepare_chunks(&self) -> Result<Vec<Chunk>, ContextorError> {
        let loader = self.loader.clone();
        let codec = self.codec.clone();
        let root = self.docs_dir.clone();
        let chunking = self.chunking;

        let (pages, chunks) = tokio::task::spawn_blocking(move || {
            let pages: Vec<Page> = loader.load(&root)?;
            let chunks = make_chunks(codec.as_ref(), &pages, &chunking)?;
            Ok::<_, ContextorError>((pages.len(), chunks))
        })
        .await
        .map_err(|e| ContextorError::Document {
            path: self.docs_dir.display().to_string(),
            reason: format!("loader task failed: {e}"),
        })??;

        info!(
            target: "contextor::index",
            pages,
            chunks = chunks.len(),
            "corpus chunked"
        );
        Ok(chunks)
    }

    async fn write_chunks(
        &self,
        chunks: Vec<Chunk>,
        progress: &dyn Progress,
    ) -> Result<usize, ContextorError> {
        progress.set_total(chunks.len() as u64);
        let items: Vec<IndexItem> = chunks.into_iter().map(to_item).collect();

        let mut written = 0usize;
        for (n, batch) in items.chunks(self.store_batch).enumerate() {
            let count = self.store.upsert(&self.collection, batch.to_vec()).await?;
            written += count;
            progress.advance(count as u64, "upserting passages");
            debug!(target: "contextor::index", batch = n, count, written, "batch stored");
        }
        Ok(written)
    }
}

pub(crate) fn check_epoch(handle: &CollectionHandle, current: u64) -> Result<(), ContextorError> {
    if handle.epoch != current {
        return Err(ContextorError::StaleHandle {
            handle: handle.epoch,
            current,
        });
    }
    Ok(())
}

fn to_item(c: Chunk) -> IndexItem {
    IndexItem {
        id: c.chunk_id,
        text: c.text,
        metadata: PassageMetadata {
            source: c.source,
            path: c.path,
            page: c.page,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_epoch_is_rejected() {
        let h = CollectionHandle {
            collection: "c".into(),
            passages: 3,
            epoch: 1,
        };
        assert!(check_epoch(&h, 1).is_ok());
        assert!(matches!(
            check_epoch(&h, 2),
            Err(ContextorError::StaleHandle {
                handle: 1,
                current: 2
            })
        ));
    }

    #[test]
    fn chunk_maps_to_index_item() {
        let item = to_item(Chunk {
            text: "body".into(),
            source: "doc.pdf".into(),
            path: "docs/doc.pdf".into(),
            page: 2,
            chunk_index: 1,
            chunk_id: "doc.pdf:p2:c1".into(),
        });
        assert_eq!(item.id, "doc.pdf:p2:c1");
        assert_eq!(item.metadata.page, 2);
        assert_eq!(item.metadata.source, "doc.pdf");
    }
}
