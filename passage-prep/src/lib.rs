//! Passage preparation: everything that happens to a document before it
//! reaches the vector store.
//!
//! - [`loader`]: walk a folder and extract per-page text ([`Page`]).
//! - [`tokenizer`]: the token codec that defines the unit of chunk sizing.
//! - [`chunker`]: overlapping token windows with stable chunk ids ([`Chunk`]).
//!
//! Nothing in this crate performs network I/O.

pub mod chunker;
pub mod errors;
pub mod loader;
pub mod model;
pub mod tokenizer;

pub use chunker::{ChunkingConfig, chunk_text, make_chunks, window_spans};
pub use errors::PrepError;
pub use loader::{DocumentLoader, FsDocumentLoader};
pub use model::{Chunk, Page, chunk_id};
pub use tokenizer::{HfTokenizer, TokenCodec};
