//! Tokenizer adapter: the unit of measurement for chunk sizing.
//!
//! The index must be built and extended with a single encoding. The
//! [`TokenCodec::encoding_id`] fingerprint lets the indexer record which
//! encoding produced a collection.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::debug;

use crate::errors::PrepError;

/// Text ⇄ token id conversion.
///
/// Implementations must be pure and deterministic; `encode("")` returns an
/// empty sequence.
pub trait TokenCodec: Send + Sync {
    /// Converts text into token ids (no special tokens).
    fn encode(&self, text: &str) -> Result<Vec<u32>, PrepError>;

    /// Converts token ids back into text.
    fn decode(&self, ids: &[u32]) -> Result<String, PrepError>;

    /// Stable identifier of the encoding scheme.
    fn encoding_id(&self) -> &str;
}

/// [`TokenCodec`] backed by a HuggingFace `tokenizer.json`.
///
/// Truncation and padding declared in the file are disabled so that every
/// token of a page is visible to the chunker.
pub struct HfTokenizer {
    inner: Tokenizer,
    encoding_id: String,
}

impl HfTokenizer {
    /// Loads a tokenizer from a `tokenizer.json` file.
    ///
    /// # Errors
    /// Returns [`PrepError::Io`] if the file cannot be read and
    /// [`PrepError::Tokenizer`] if it cannot be deserialized.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PrepError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading tokenizer");
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Builds a tokenizer from serialized JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrepError> {
        let mut inner = Tokenizer::from_bytes(bytes)
            .map_err(|e| PrepError::Tokenizer(format!("failed to deserialize tokenizer: {e}")))?;
        inner
            .with_truncation(None)
            .map_err(|e| PrepError::Tokenizer(format!("failed to disable truncation: {e}")))?;
        inner.with_padding(None);

        let encoding_id = format!("blake3:{}", blake3::hash(bytes).to_hex());
        debug!(%encoding_id, "tokenizer ready");

        Ok(Self { inner, encoding_id })
    }
}

impl TokenCodec for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, PrepError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let enc = self
            .inner
            .encode(text, false)
            .map_err(|e| PrepError::Tokenizer(format!("encode failed: {e}")))?;
        Ok(enc.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, PrepError> {
        if ids.is_empty() {
            return Ok(String::new());
        }
        self.inner
            .decode(ids, false)
            .map_err(|e| PrepError::Tokenizer(format!("decode failed: {e}")))
    }

    fn encoding_id(&self) -> &str {
        &self.encoding_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[UNK]": 0, "annual": 1, "leave": 2, "policy": 3 },
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn encodes_and_decodes_words() {
        let tok = HfTokenizer::from_bytes(WORD_LEVEL.as_bytes()).unwrap();
        let ids = tok.encode("annual leave policy").unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(tok.decode(&ids).unwrap(), "annual leave policy");
    }

    #[test]
    fn empty_input_is_empty_sequence() {
        let tok = HfTokenizer::from_bytes(WORD_LEVEL.as_bytes()).unwrap();
        assert!(tok.encode("").unwrap().is_empty());
        assert_eq!(tok.decode(&[]).unwrap(), "");
    }

    #[test]
    fn fingerprint_is_stable_per_file() {
        let a = HfTokenizer::from_bytes(WORD_LEVEL.as_bytes()).unwrap();
        let b = HfTokenizer::from_bytes(WORD_LEVEL.as_bytes()).unwrap();
        assert_eq!(a.encoding_id(), b.encoding_id());
        assert!(a.encoding_id().starts_with("blake3:"));
    }

    #[test]
    fn rejects_garbage() {
        let err = HfTokenizer::from_bytes(b"not json").err().unwrap();
        assert!(matches!(err, PrepError::Tokenizer(_)));
    }
}
