//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use passage_prep::ChunkingConfig;
use rag_store::RagConfig;

use crate::error::ContextorError;

/// Config bag for the pipeline. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    /// Folder walked by the document loader.
    pub docs_dir: PathBuf,
    /// HuggingFace `tokenizer.json` defining the chunk-size unit.
    pub tokenizer_path: PathBuf,
    pub chunking: ChunkingConfig,

    /// Default number of passages per question.
    pub top_k: u64,
    /// Passages per store upsert call.
    pub store_batch: usize,

    pub collection: String,
    /// Where index manifests are written.
    pub manifest_dir: PathBuf,

    /// Store connection / embedding knobs.
    pub rag: RagConfig,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./documents"),
            tokenizer_path: PathBuf::from("./tokenizer.json"),
            chunking: ChunkingConfig::default(),
            top_k: 5,
            store_batch: 256,
            collection: "doc_passages".into(),
            manifest_dir: PathBuf::from("./rag_index"),
            rag: RagConfig::default(),
        }
    }
}

impl ContextorConfig {
    /// Build from environment variables with defaults.
    ///
    /// Variables: `DOCS_DIR`, `TOKENIZER_PATH`, `CHUNK_TOKENS`,
    /// `CHUNK_OVERLAP`, `RAG_TOP_K`, `QDRANT_BATCH_SIZE`,
    /// `QDRANT_COLLECTION`, `INDEX_MANIFEST_DIR`, plus everything read by
    /// [`RagConfig::from_env`].
    ///
    /// # Errors
    /// [`ContextorError::Config`] for unparsable values,
    /// [`ContextorError::ChunkingConfig`] for an unusable window/overlap.
    pub fn from_env() -> Result<Self, ContextorError> {
        let d = Self::default();

        let cfg = Self {
            docs_dir: env_opt("DOCS_DIR").map(PathBuf::from).unwrap_or(d.docs_dir),
            tokenizer_path: env_opt("TOKENIZER_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.tokenizer_path),
            chunking: ChunkingConfig {
                chunk_tokens: parse("CHUNK_TOKENS", d.chunking.chunk_tokens)?,
                overlap: parse("CHUNK_OVERLAP", d.chunking.overlap)?,
            },
            top_k: parse("RAG_TOP_K", d.top_k)?,
            store_batch: parse("QDRANT_BATCH_SIZE", d.store_batch)?,
            collection: env_opt("QDRANT_COLLECTION").unwrap_or(d.collection),
            manifest_dir: env_opt("INDEX_MANIFEST_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.manifest_dir),
            rag: RagConfig::from_env()?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        self.chunking.validate()?;
        if self.top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.store_batch == 0 {
            return Err(ContextorError::Config("QDRANT_BATCH_SIZE must be > 0".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(ContextorError::Config("QDRANT_COLLECTION is empty".into()));
        }
        self.rag.validate()?;
        Ok(())
    }
}

fn env_opt(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `k` when set; a malformed value is an error rather than a silent default.
fn parse<T: FromStr>(k: &str, dflt: T) -> Result<T, ContextorError> {
    match env_opt(k) {
        Some(v) => v
            .parse()
            .map_err(|_| ContextorError::Config(format!("{k}: cannot parse `{v}`"))),
        None => Ok(dflt),
    }
}
