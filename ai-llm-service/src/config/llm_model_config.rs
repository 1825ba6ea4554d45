use crate::config::llm_provider::LlmProvider;

/// Configuration of one LLM profile (generation or embedding).
///
/// `endpoint` is the provider base URL (e.g. `http://localhost:11434` or
/// `https://api.openai.com`); clients append the REST paths themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier (e.g. `"gpt-4o-mini"`, `"nomic-embed-text"`).
    pub model: String,

    /// Provider base URL.
    pub endpoint: String,

    /// API key for providers that require authentication (OpenAI).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout in seconds (defaults to 60 in the clients).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Effective request timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(60))
    }
}
