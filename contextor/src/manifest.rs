//! Index manifest: a local marker written after a population completes.
//!
//! The store itself only knows how many passages a collection holds. The
//! manifest records what a *complete* run produced, so a later run that
//! trusts `count > 0` can still warn about partial indexes and about
//! configuration drift (tokenizer, embedding model, chunking).

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ContextorError;

/// What a finished population looked like.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub collection: String,
    /// Passages written by the run.
    pub passages: u64,
    /// Tokenizer fingerprint ([`passage_prep::TokenCodec::encoding_id`]).
    pub encoding_id: String,
    pub embedding_model: String,
    pub chunk_tokens: usize,
    pub overlap: usize,
    pub completed_at: DateTime<Utc>,
}

/// Settings of the current process, compared against a stored manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexFingerprint {
    pub encoding_id: String,
    pub embedding_model: String,
    pub chunk_tokens: usize,
    pub overlap: usize,
}

/// Soft problems found on a reused index. Nothing is repaired automatically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexWarning {
    /// Populated collection without a completion marker (interrupted run or
    /// index built elsewhere).
    ManifestMissing,
    /// Stored count differs from what the last complete run wrote.
    PartialIndex { expected: u64, found: u64 },
    EncodingDrift { indexed: String, current: String },
    EmbeddingModelDrift { indexed: String, current: String },
    ChunkingDrift {
        indexed: (usize, usize),
        current: (usize, usize),
    },
}

impl fmt::Display for IndexWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestMissing => {
                write!(f, "no index manifest; the collection may be incomplete")
            }
            Self::PartialIndex { expected, found } => write!(
                f,
                "partial index: {found} passages stored, last complete run wrote {expected}"
            ),
            Self::EncodingDrift { indexed, current } => write!(
                f,
                "tokenizer changed since indexing ({indexed} -> {current}); rebuild to re-chunk"
            ),
            Self::EmbeddingModelDrift { indexed, current } => write!(
                f,
                "embedding model changed since indexing ({indexed} -> {current}); rebuild required"
            ),
            Self::ChunkingDrift { indexed, current } => write!(
                f,
                "chunking changed since indexing ({}/{} -> {}/{})",
                indexed.0, indexed.1, current.0, current.1
            ),
        }
    }
}

/// Compares a stored manifest with the live count and current settings.
pub fn compare(
    manifest: Option<&IndexManifest>,
    stored: u64,
    current: &IndexFingerprint,
) -> Vec<IndexWarning> {
    let Some(m) = manifest else {
        return vec![IndexWarning::ManifestMissing];
    };

    let mut out = Vec::new();
    if m.passages != stored {
        out.push(IndexWarning::PartialIndex {
            expected: m.passages,
            found: stored,
        });
    }
    if m.encoding_id != current.encoding_id {
        out.push(IndexWarning::EncodingDrift {
            indexed: m.encoding_id.clone(),
            current: current.encoding_id.clone(),
        });
    }
    if m.embedding_model != current.embedding_model {
        out.push(IndexWarning::EmbeddingModelDrift {
            indexed: m.embedding_model.clone(),
            current: current.embedding_model.clone(),
        });
    }
    if (m.chunk_tokens, m.overlap) != (current.chunk_tokens, current.overlap) {
        out.push(IndexWarning::ChunkingDrift {
            indexed: (m.chunk_tokens, m.overlap),
            current: (current.chunk_tokens, current.overlap),
        });
    }
    out
}

/// Reads and writes `<dir>/<collection>.manifest.json`.
#[derive(Clone, Debug)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.manifest.json"))
    }

    /// `Ok(None)` when no manifest exists.
    pub fn load(&self, collection: &str) -> Result<Option<IndexManifest>, ContextorError> {
        let path = self.path(collection);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes atomically (temp file + rename).
    pub fn save(&self, manifest: &IndexManifest) -> Result<(), ContextorError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(&manifest.collection);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(manifest)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), passages = manifest.passages, "manifest written");
        Ok(())
    }

    /// Removes the manifest; absent is fine.
    pub fn remove(&self, collection: &str) -> Result<(), ContextorError> {
        remove_if_present(&self.path(collection))
    }
}

fn remove_if_present(path: &Path) -> Result<(), ContextorError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
