//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::LlmServiceProfiles;
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let svc = Arc::new(LlmServiceProfiles::from_env()?);
//!
//! let vectors = svc.embed_batch(&["annual leave".to_string()]).await?;
//! println!("dim = {}", vectors[0].vector.len());
//!
//! let txt = svc.generate("Answer briefly.", "What is Rust?").await?;
//! println!("{txt}");
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{
        default_config::{config_embedding, config_generation},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    services::{
        IndexedEmbedding, ollama_service::OllamaService, open_ai_service::OpenAiService,
    },
};

/// Manages the **generation** and **embedding** profiles.
///
/// Internally caches Ollama/OpenAI clients keyed by their configuration to
/// avoid recreating HTTP clients on each call.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Self {
        Self {
            generation,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        }
    }

    /// Builds both profiles from the environment.
    ///
    /// # Errors
    /// Any [`AiLlmError::Config`] raised by
    /// [`config_generation`] / [`config_embedding`].
    pub fn from_env() -> Result<Self, AiLlmError> {
        Ok(Self::new(config_generation()?, config_embedding()?))
    }

    /// One chat completion on the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the request fails or the reply is empty.
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, AiLlmError> {
        let cfg = &self.generation;
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_client(cfg).await?.chat(system, user).await,
            LlmProvider::OpenAI => self.openai_client(cfg).await?.chat(system, user).await,
        }
    }

    /// Embeds one batch on the **embedding** profile.
    ///
    /// Vectors are index-tagged relative to `inputs`.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<IndexedEmbedding>, AiLlmError> {
        let cfg = &self.embedding;
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_client(cfg).await?.embed_batch(inputs).await,
            LlmProvider::OpenAI => self.openai_client(cfg).await?.embed_batch(inputs).await,
        }
    }

    /// Returns the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn ollama_client(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        debug!(model = %cfg.model, "creating Ollama client");
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn openai_client(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        debug!(model = %cfg.model, "creating OpenAI client");
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(10),
        }
    }

    #[tokio::test]
    async fn clients_are_cached_per_config() {
        let svc = LlmServiceProfiles::new(ollama("llama3.1"), ollama("nomic-embed-text"));
        let (generation, embedding) = svc.profiles();

        let a = svc.ollama_client(generation).await.unwrap();
        let b = svc.ollama_client(generation).await.unwrap();
        let c = svc.ollama_client(embedding).await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(svc.ollama.read().await.len(), 2);
    }

    #[tokio::test]
    async fn invalid_profile_surfaces_error_instead_of_panicking() {
        let mut bad = ollama("gpt-4o-mini");
        bad.provider = LlmProvider::OpenAI;
        let svc = LlmServiceProfiles::new(bad, ollama("nomic-embed-text"));
        let err = svc.generate("sys", "user").await.unwrap_err();
        assert!(matches!(err, AiLlmError::Provider(_)));
    }

    #[tokio::test]
    async fn empty_batch_needs_no_request() {
        let svc = LlmServiceProfiles::new(ollama("llama3.1"), ollama("nomic-embed-text"));
        assert!(svc.embed_batch(&[]).await.unwrap().is_empty());
    }
}
