//! Provider clients.

pub mod ollama_service;
pub mod open_ai_service;

use serde::{Deserialize, Serialize};

/// One embedding vector tagged with the position of its input text in the
/// request batch.
///
/// Providers may return vectors out of order; callers place them by `index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEmbedding {
    pub index: usize,
    pub vector: Vec<f32>,
}
