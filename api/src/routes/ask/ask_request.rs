use contextor::Citation;
use rag_store::RetrievalHit;
use serde::{Deserialize, Serialize};

/// Request payload for /ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    pub question: String,
    /// Optional override of the passage count; clamped to 3..=10.
    #[serde(default)]
    pub top_k: Option<u64>,
}

/// Response payload for /ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Model answer, unmodified. Absent when generation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// The model gave the "not in the documents" reply.
    pub not_found: bool,
    /// `(Source, page)` references parsed from the answer.
    pub citations: Vec<Citation>,
    /// Passages the answer was grounded on, most similar first.
    pub sources: Vec<SourceItem>,
}

/// Provenance of one retrieved passage.
#[derive(Debug, Serialize)]
pub struct SourceItem {
    pub source: String,
    pub page: u32,
    pub chunk_id: String,
    pub score: f32,
}

impl From<&RetrievalHit> for SourceItem {
    fn from(h: &RetrievalHit) -> Self {
        Self {
            source: h.metadata.source.clone(),
            page: h.metadata.page,
            chunk_id: h.chunk_id.clone(),
            score: h.score,
        }
    }
}
