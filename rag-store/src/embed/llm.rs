//! Embedding provider backed by the shared [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::error_handler::{ProviderError, ProviderErrorKind};
use ai_llm_service::{AiLlmError, IndexedEmbedding, LlmServiceProfiles};
use futures::future::BoxFuture;

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;

/// Uses the **embedding** profile of the LLM service (Ollama or OpenAI).
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    model: String,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        let model = svc.profiles().1.model.clone();
        Self { svc, model }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<IndexedEmbedding>, RagError>> {
        Box::pin(async move { self.svc.embed_batch(texts).await.map_err(map_llm_error) })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn map_llm_error(e: AiLlmError) -> RagError {
    match e {
        AiLlmError::Provider(ProviderError {
            kind: ProviderErrorKind::Pairing(msg),
            ..
        }) => RagError::EmbeddingPairing(msg),
        other => RagError::EmbeddingProvider(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::error_handler::Provider;
    use std::time::Duration;

    #[test]
    fn pairing_errors_keep_their_kind() {
        let e = AiLlmError::from(ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::Pairing("duplicate index 0".into()),
        ));
        assert!(matches!(map_llm_error(e), RagError::EmbeddingPairing(m) if m == "duplicate index 0"));
    }

    #[test]
    fn timeouts_are_provider_errors() {
        let e = AiLlmError::Timeout(Duration::from_secs(60));
        assert!(matches!(map_llm_error(e), RagError::EmbeddingProvider(_)));
    }
}
