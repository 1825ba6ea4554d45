//! Core data models: raw pages and the chunks cut from them.

use serde::{Deserialize, Serialize};

/// Raw text of one physical page of one source document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub text: String,
    /// Human-readable document name (the file name).
    pub source: String,
    /// Document locator (full path as seen by the loader).
    pub path: String,
    /// 1-based page number.
    pub page: u32,
}

/// A token-bounded slice of a [`Page`], the unit of retrieval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub path: String,
    pub page: u32,
    /// 0-based position within the page's emitted chunks.
    pub chunk_index: usize,
    /// `<source>:p<page>:c<chunk_index>`.
    pub chunk_id: String,
}

impl Chunk {
    /// Builds the `chunk_index`-th chunk of `page`.
    pub fn from_page(page: &Page, chunk_index: usize, text: String) -> Self {
        Self {
            chunk_id: chunk_id(&page.source, page.page, chunk_index),
            text,
            source: page.source.clone(),
            path: page.path.clone(),
            page: page.page,
            chunk_index,
        }
    }
}

/// Deterministic chunk id; stable across runs for unchanged input.
pub fn chunk_id(source: &str, page: u32, chunk_index: usize) -> String {
    format!("{source}:p{page}:c{chunk_index}")
}
