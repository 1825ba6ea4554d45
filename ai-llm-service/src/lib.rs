//! Shared LLM service used by the indexing and answering pipeline.
//!
//! Two logical profiles are managed by [`service_profiles::LlmServiceProfiles`]:
//! - **generation**: chat completion used to write grounded answers;
//! - **embedding**: batched text embeddings used on both the write and query
//!   paths of the vector store.
//!
//! Providers: local Ollama and the OpenAI REST API. Configuration is read
//! from the environment by [`config::default_config`].

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, Result};
pub use service_profiles::LlmServiceProfiles;
pub use services::IndexedEmbedding;
