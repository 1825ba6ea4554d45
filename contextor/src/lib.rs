//! Document RAG pipeline: indexing, retrieval and grounded answering.
//!
//! Public API:
//! - [`Indexer::ensure_index`]: load, chunk, embed and store the corpus once
//!   and hand out a [`CollectionHandle`]
//! - [`Retriever::retrieve`]: top-k passages for a question
//! - [`Answerer::answer`]: one grounded generation call with `(Source, page)`
//!   citations
//! - [`Contextor`]: the three wired together from environment config

mod answer;
mod cfg;
mod error;
mod indexer;
mod manifest;
mod progress;
pub mod prompt;
mod retrieve;

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use passage_prep::{FsDocumentLoader, HfTokenizer};
use rag_store::{LlmEmbedder, RagStore, RetrievalHit};
use tracing::info;

pub use answer::{AnswerResult, Answerer, Citation, TextGenerator};
pub use cfg::ContextorConfig;
pub use error::ContextorError;
pub use indexer::{
    CollectionHandle, IndexAction, IndexReport, IndexState, Indexer, IndexerSettings,
};
pub use manifest::{IndexFingerprint, IndexManifest, IndexWarning, ManifestStore};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use retrieve::Retriever;

/// Indexer, retriever and answerer sharing one store and one epoch.
#[derive(Clone)]
pub struct Contextor {
    indexer: Indexer,
    retriever: Retriever,
    answerer: Answerer,
    top_k: u64,
}

impl Contextor {
    pub fn new(indexer: Indexer, answerer: Answerer, top_k: u64) -> Self {
        let retriever = indexer.retriever();
        Self {
            indexer,
            retriever,
            answerer,
            top_k,
        }
    }

    /// Wires the production pipeline: HuggingFace tokenizer, filesystem
    /// loader, LLM-service embeddings/generation and the configured store.
    ///
    /// # Errors
    /// `Tokenizer` when the tokenizer file cannot be loaded, `Config` /
    /// `StoreUnavailable` from the store.
    pub fn from_config(
        cfg: &ContextorConfig,
        svc: Arc<LlmServiceProfiles>,
    ) -> Result<Self, ContextorError> {
        cfg.validate()?;

        let codec = Arc::new(HfTokenizer::from_file(&cfg.tokenizer_path)?);
        let store = RagStore::new(&cfg.rag, Arc::new(LlmEmbedder::new(svc.clone())))?;
        info!(
            collection = %cfg.collection,
            docs = %cfg.docs_dir.display(),
            embedding_model = store.embedding_model(),
            "pipeline configured"
        );

        let indexer = Indexer::new(
            store,
            codec,
            Arc::new(FsDocumentLoader::new()),
            IndexerSettings {
                docs_dir: cfg.docs_dir.clone(),
                chunking: cfg.chunking,
                store_batch: cfg.store_batch,
                collection: cfg.collection.clone(),
                manifest_dir: cfg.manifest_dir.clone(),
            },
        );
        Ok(Self::new(indexer, Answerer::new(svc), cfg.top_k))
    }

    /// [`ContextorConfig::from_env`] + [`Contextor::from_config`].
    pub fn from_env(svc: Arc<LlmServiceProfiles>) -> Result<Self, ContextorError> {
        Self::from_config(&ContextorConfig::from_env()?, svc)
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn collection(&self) -> &str {
        self.indexer.collection()
    }

    /// Configured default for `top_k`.
    pub fn default_top_k(&self) -> u64 {
        self.top_k
    }

    pub async fn ensure_index(
        &self,
        rebuild: bool,
        progress: &dyn Progress,
    ) -> Result<IndexReport, ContextorError> {
        self.indexer.ensure_index(rebuild, progress).await
    }

    pub async fn retrieve(
        &self,
        handle: &CollectionHandle,
        query: &str,
        top_k: u64,
    ) -> Result<Vec<RetrievalHit>, ContextorError> {
        self.retriever.retrieve(handle, query, top_k).await
    }

    pub async fn answer(
        &self,
        query: &str,
        hits: Vec<RetrievalHit>,
    ) -> Result<AnswerResult, ContextorError> {
        self.answerer.answer(query, hits).await
    }

    /// Retrieve then answer.
    ///
    /// # Example
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use contextor::{Contextor, NoopProgress};
    /// # use ai_llm_service::LlmServiceProfiles;
    /// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let svc = Arc::new(LlmServiceProfiles::from_env()?);
    /// let ctx = Contextor::from_env(svc)?;
    /// let report = ctx.ensure_index(false, &NoopProgress).await?;
    /// let res = ctx.ask(&report.handle, "What is the leave policy?", 3).await?;
    /// println!("{}", res.answer_text);
    /// # Ok(()) }
    /// ```
    pub async fn ask(
        &self,
        handle: &CollectionHandle,
        query: &str,
        top_k: u64,
    ) -> Result<AnswerResult, ContextorError> {
        let hits = self.retrieve(handle, query, top_k).await?;
        self.answer(query, hits).await
    }
}
