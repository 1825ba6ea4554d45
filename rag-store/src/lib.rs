//! Passage store: embeddings + vector index behind one facade.
//!
//! This crate provides:
//! - [`EmbeddingClient`]: batched embedding with explicit index pairing
//! - [`VectorIndex`]: collection operations, implemented for Qdrant
//!   ([`QdrantIndex`]) and in-process ([`MemoryIndex`])
//! - [`RagStore`]: the facade that owns the embedding call on both the write
//!   path ([`RagStore::upsert`]) and the query path ([`RagStore::query`])

mod config;
mod embed;
mod errors;
mod index;
mod qdrant_facade;
mod record;

use std::sync::Arc;

pub use config::{DistanceKind, RagConfig, StoreKind, VectorSpace};
pub use embed::llm::LlmEmbedder;
pub use embed::{EmbeddingClient, EmbeddingsProvider, IndexedEmbedding};
pub use errors::RagError;
pub use index::{MemoryIndex, VectorIndex};
pub use qdrant_facade::QdrantIndex;
pub use record::{DeleteOutcome, IndexItem, PassageMetadata, RetrievalHit, VectorPoint};

use tracing::{debug, info, trace, warn};

/// High-level facade over a [`VectorIndex`] and an [`EmbeddingClient`].
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    index: Arc<dyn VectorIndex>,
    embedder: EmbeddingClient,
    distance: DistanceKind,
    embedding_dim: Option<usize>,
}

impl RagStore {
    /// Builds the backend selected by `cfg.store`.
    ///
    /// # Errors
    /// Returns `RagError::Config` on invalid settings and
    /// `RagError::StoreUnavailable` if the Qdrant client cannot be built.
    pub fn new(cfg: &RagConfig, provider: Arc<dyn EmbeddingsProvider>) -> Result<Self, RagError> {
        cfg.validate()?;
        let index: Arc<dyn VectorIndex> = match cfg.store {
            StoreKind::Qdrant => Arc::new(QdrantIndex::new(cfg)?),
            StoreKind::Memory => {
                warn!("RAG_STORE=memory: passages are kept in-process only");
                Arc::new(MemoryIndex::new())
            }
        };
        let embedder = EmbeddingClient::new(provider, cfg.embedding_batch)?
            .with_expected_dim(cfg.embedding_dim);
        Ok(Self::with_parts(index, embedder, cfg))
    }

    /// Assembles a store from explicit parts (tests, custom backends).
    pub fn with_parts(
        index: Arc<dyn VectorIndex>,
        embedder: EmbeddingClient,
        cfg: &RagConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            distance: cfg.distance,
            embedding_dim: cfg.embedding_dim,
        }
    }

    /// Identifier of the embedding model used on both paths.
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_id()
    }

    pub async fn exists(&self, collection: &str) -> Result<bool, RagError> {
        self.index.exists(collection).await
    }

    pub async fn count(&self, collection: &str) -> Result<u64, RagError> {
        self.index.count(collection).await
    }

    /// Drops the collection. An absent collection is reported, not raised.
    pub async fn delete(&self, collection: &str) -> Result<DeleteOutcome, RagError> {
        let outcome = self.index.delete(collection).await?;
        if outcome == DeleteOutcome::Absent {
            debug!(collection, "delete: collection was absent");
        }
        Ok(outcome)
    }

    /// Create-or-get. Returns `true` when the collection was created.
    ///
    /// The vector size comes from the configured `EMBEDDING_DIM`, or from
    /// embedding `probe_text` once when unset.
    ///
    /// # Errors
    /// Embedding errors from the probe and store errors from creation.
    pub async fn ensure_collection(&self, collection: &str, probe_text: &str) -> Result<bool, RagError> {
        if self.index.exists(collection).await? {
            trace!(collection, "ensure_collection: exists");
            return Ok(false);
        }

        let size = match self.embedding_dim {
            Some(dim) => dim,
            None => {
                let probe = self.embedder.embed_one(probe_text).await?;
                debug!(dim = probe.len(), "embedding size probed");
                probe.len()
            }
        };

        self.index
            .create(
                collection,
                VectorSpace {
                    size,
                    distance: self.distance,
                },
            )
            .await?;
        info!(collection, size, distance = ?self.distance, "collection ready");
        Ok(true)
    }

    /// Embeds `items` and inserts/replaces them by id.
    ///
    /// The caller bounds the batch size; embedding requests are further
    /// split by the embedding client's own batch size.
    pub async fn upsert(&self, collection: &str, items: Vec<IndexItem>) -> Result<usize, RagError> {
        if items.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = items.iter().map(|i| i.text.clone()).collect();
        let vectors = self.embedder.embed_all(&texts).await?;

        let points = items
            .into_iter()
            .zip(vectors)
            .map(|(item, vector)| VectorPoint { item, vector })
            .collect();

        self.index.upsert(collection, points).await
    }

    /// Embeds `query_text` with the same model and returns at most `top_k`
    /// hits, most similar first.
    pub async fn query(
        &self,
        collection: &str,
        query_text: &str,
        top_k: u64,
    ) -> Result<Vec<RetrievalHit>, RagError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed_one(query_text).await?;
        let hits = self.index.search(collection, vector, top_k).await?;
        trace!(collection, top_k, hits = hits.len(), "query");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bag-of-letters embedding: 26 dims, one per ASCII letter.
    struct Letters {
        calls: AtomicUsize,
    }

    impl EmbeddingsProvider for Letters {
        fn embed_batch<'a>(
            &'a self,
            texts: &'a [String],
        ) -> BoxFuture<'a, Result<Vec<IndexedEmbedding>, RagError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(texts
                    .iter()
                    .enumerate()
                    .map(|(index, t)| {
                        let mut v = vec![0.0f32; 26];
                        for b in t.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                            v[(b - b'a') as usize] += 1.0;
                        }
                        IndexedEmbedding { index, vector: v }
                    })
                    .collect())
            })
        }

        fn model_id(&self) -> &str {
            "letters"
        }
    }

    fn store(dim: Option<usize>) -> (RagStore, Arc<Letters>) {
        let p = Arc::new(Letters {
            calls: AtomicUsize::new(0),
        });
        let cfg = RagConfig {
            store: StoreKind::Memory,
            embedding_dim: dim,
            ..RagConfig::default()
        };
        (RagStore::new(&cfg, p.clone()).unwrap(), p)
    }

    fn item(id: &str, text: &str) -> IndexItem {
        IndexItem {
            id: id.into(),
            text: text.into(),
            metadata: PassageMetadata {
                source: "hr.pdf".into(),
                path: "docs/hr.pdf".into(),
                page: 1,
            },
        }
    }

    #[tokio::test]
    async fn ensure_collection_probes_once() {
        let (s, p) = store(None);
        assert!(s.ensure_collection("c", "probe").await.unwrap());
        assert!(!s.ensure_collection("c", "probe").await.unwrap());
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
        assert_eq!(s.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn configured_dim_skips_probe() {
        let (s, p) = store(Some(26));
        s.ensure_collection("c", "probe").await.unwrap();
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_query_ranks() {
        let (s, _) = store(None);
        s.ensure_collection("c", "probe").await.unwrap();
        s.upsert(
            "c",
            vec![
                item("a", "leave leave leave"),
                item("b", "expenses and receipts"),
            ],
        )
        .await
        .unwrap();
        s.upsert("c", vec![item("a", "leave policy")]).await.unwrap();
        assert_eq!(s.count("c").await.unwrap(), 2);

        let hits = s.query("c", "leave policy", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "a");
        assert_eq!(hits[0].text, "leave policy");
    }

    #[tokio::test]
    async fn delete_absent_is_reported() {
        let (s, _) = store(None);
        assert_eq!(s.delete("nope").await.unwrap(), DeleteOutcome::Absent);
    }

    #[tokio::test]
    async fn zero_top_k_is_empty_without_embedding() {
        let (s, p) = store(Some(26));
        s.ensure_collection("c", "probe").await.unwrap();
        assert!(s.query("c", "anything", 0).await.unwrap().is_empty());
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }
}
