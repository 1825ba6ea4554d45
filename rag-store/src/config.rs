//! Runtime and collection configuration.

use serde::{Deserialize, Serialize};

use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl DistanceKind {
    /// Parse from env string (case-insensitive). Defaults to Cosine.
    pub fn parse(s: Option<&str>) -> Result<Self, RagError> {
        match s.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("cosine") => Ok(DistanceKind::Cosine),
            Some("dot") | Some("dotproduct") => Ok(DistanceKind::Dot),
            Some("euclid") | Some("l2") => Ok(DistanceKind::Euclid),
            Some(other) => Err(RagError::Config(format!(
                "unsupported QDRANT_DISTANCE `{other}` (cosine | dot | euclid)"
            ))),
        }
    }
}

/// Describes the vector space of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Which [`crate::VectorIndex`] backend to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Qdrant,
    /// In-process index; nothing survives a restart.
    Memory,
}

/// Configuration for the passage store.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub store: StoreKind,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Fixed embedding size; probed from the provider when `None`.
    pub embedding_dim: Option<usize>,
    /// Texts per embedding request.
    pub embedding_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Qdrant,
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            distance: DistanceKind::Cosine,
            embedding_dim: None,
            embedding_batch: 64,
            exact_search: false,
        }
    }
}

impl RagConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `RAG_STORE` (`qdrant` | `memory`; default: `qdrant`)
    /// - `QDRANT_URL` (default: `http://localhost:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_DISTANCE` (`cosine` | `dot` | `euclid`; default: `cosine`)
    /// - `EMBEDDING_DIM` (optional; probed when unset)
    /// - `EMBEDDING_BATCH_SIZE` (default: 64)
    /// - `RAG_EXACT_SEARCH` (default: false)
    pub fn from_env() -> Result<Self, RagError> {
        let d = Self::default();

        let store = match env_opt("RAG_STORE").as_deref() {
            None | Some("qdrant") => StoreKind::Qdrant,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(RagError::Config(format!(
                    "unsupported RAG_STORE `{other}` (qdrant | memory)"
                )));
            }
        };

        let cfg = Self {
            store,
            qdrant_url: env_opt("QDRANT_URL").unwrap_or(d.qdrant_url),
            qdrant_api_key: env_opt("QDRANT_API_KEY"),
            distance: DistanceKind::parse(env_opt("QDRANT_DISTANCE").as_deref())?,
            embedding_dim: read_usize_env("EMBEDDING_DIM")?,
            embedding_batch: read_usize_env("EMBEDDING_BATCH_SIZE")?.unwrap_or(d.embedding_batch),
            exact_search: read_bool_env("RAG_EXACT_SEARCH")?.unwrap_or(d.exact_search),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.store == StoreKind::Qdrant && self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.embedding_batch == 0 {
            return Err(RagError::Config("EMBEDDING_BATCH_SIZE must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an optional `usize` from env; a present but invalid value is an error.
fn read_usize_env(key: &str) -> Result<Option<usize>, RagError> {
    match env_opt(key) {
        Some(v) => v
            .parse::<usize>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("{key} must be a non-negative integer, got `{v}`"))),
        None => Ok(None),
    }
}

/// Read an optional `bool` from env.
fn read_bool_env(key: &str) -> Result<Option<bool>, RagError> {
    match env_opt(key) {
        Some(v) => v
            .to_ascii_lowercase()
            .parse::<bool>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("{key} must be true or false, got `{v}`"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_parsing() {
        assert_eq!(DistanceKind::parse(None).unwrap(), DistanceKind::Cosine);
        assert_eq!(DistanceKind::parse(Some("L2")).unwrap(), DistanceKind::Euclid);
        assert!(DistanceKind::parse(Some("manhattan")).is_err());
    }

    #[test]
    fn zero_batch_is_invalid() {
        let cfg = RagConfig {
            embedding_batch: 0,
            ..RagConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn memory_store_ignores_url() {
        let cfg = RagConfig {
            store: StoreKind::Memory,
            qdrant_url: String::new(),
            ..RagConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
