//! Token-window chunker.
//!
//! A page is tokenized once and cut into windows of `chunk_tokens` tokens,
//! consecutive windows sharing `overlap` tokens. Each window is decoded back
//! to text and trimmed; windows that end up blank are dropped without
//! shifting the offsets of the following ones.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::PrepError;
use crate::model::{Chunk, Page};
use crate::tokenizer::TokenCodec;

/// Window size and overlap, both in tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_tokens: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: 700,
            overlap: 120,
        }
    }
}

impl ChunkingConfig {
    /// Validated constructor.
    ///
    /// # Errors
    /// [`PrepError::ChunkingConfig`] when `chunk_tokens == 0` or
    /// `overlap >= chunk_tokens`.
    pub fn new(chunk_tokens: usize, overlap: usize) -> Result<Self, PrepError> {
        let cfg = Self {
            chunk_tokens,
            overlap,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PrepError> {
        if self.chunk_tokens == 0 {
            return Err(PrepError::ChunkingConfig(
                "chunk_tokens must be greater than 0".into(),
            ));
        }
        if self.overlap >= self.chunk_tokens {
            return Err(PrepError::ChunkingConfig(format!(
                "overlap ({}) must be smaller than chunk_tokens ({})",
                self.overlap, self.chunk_tokens
            )));
        }
        Ok(())
    }
}

/// Token spans `[start, end)` covering `total` tokens.
///
/// The last span always ends at `total`. For `total == 0` no span is produced.
pub fn window_spans(total: usize, cfg: &ChunkingConfig) -> Result<Vec<Range<usize>>, PrepError> {
    cfg.validate()?;

    let mut spans = Vec::with_capacity(total / (cfg.chunk_tokens - cfg.overlap) + 1);
    let mut start = 0usize;
    while start < total {
        let end = (start + cfg.chunk_tokens).min(total);
        spans.push(start..end);
        if end == total {
            break;
        }
        start = end.saturating_sub(cfg.overlap);
    }
    Ok(spans)
}

/// Splits `text` into trimmed, non-empty window texts in order.
pub fn chunk_text(
    codec: &dyn TokenCodec,
    text: &str,
    cfg: &ChunkingConfig,
) -> Result<Vec<String>, PrepError> {
    cfg.validate()?;

    let ids = codec.encode(text)?;
    let spans = window_spans(ids.len(), cfg)?;

    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        let decoded = codec.decode(&ids[span.clone()])?;
        let trimmed = decoded.trim();
        if trimmed.is_empty() {
            trace!(start = span.start, end = span.end, "dropping blank window");
            continue;
        }
        out.push(trimmed.to_string());
    }
    Ok(out)
}

/// Chunks every page, assigning `chunk_index` by emission order per page.
///
/// # Errors
/// - [`PrepError::ChunkingConfig`] before any tokenization if `cfg` is invalid.
/// - [`PrepError::DuplicateChunkId`] if two chunks resolve to the same id
///   (for instance two documents with the same file name in different folders).
pub fn make_chunks(
    codec: &dyn TokenCodec,
    pages: &[Page],
    cfg: &ChunkingConfig,
) -> Result<Vec<Chunk>, PrepError> {
    cfg.validate()?;

    let mut chunks = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for page in pages {
        let texts = chunk_text(codec, &page.text, cfg)?;
        for (i, text) in texts.into_iter().enumerate() {
            let chunk = Chunk::from_page(page, i, text);
            if !seen.insert(chunk.chunk_id.clone()) {
                return Err(PrepError::DuplicateChunkId(chunk.chunk_id));
            }
            chunks.push(chunk);
        }
    }

    debug!(
        pages = pages.len(),
        chunks = chunks.len(),
        chunk_tokens = cfg.chunk_tokens,
        overlap = cfg.overlap,
        "chunking done"
    );
    Ok(chunks)
}
