//! Default LLM configs loaded from environment variables.
//!
//! Two roles are built here, for the provider selected by `LLM_KIND`:
//!
//! - **Generation** → chat model that writes grounded answers
//! - **Embedding**  → embedding model used for passages and queries
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = `ollama` (default) or `openai`
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = request timeout, default 60
//! - `GENERATION_MODEL`, `EMBEDDING_MODEL`
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - both model variables are mandatory
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` (mandatory)
//! - `OPENAI_URL` (default `https://api.openai.com`)
//! - models default to `gpt-4o-mini` / `text-embedding-3-small`

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_opt_u32, env_opt_u64, must_env,
        validate_http_endpoint,
    },
};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_GENERATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Provider selected by `LLM_KIND` (defaults to Ollama).
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match env_opt("LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::Ollama),
    }
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = env_opt("OLLAMA_PORT") {
        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = env_opt("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", &url)?;
    Ok(url)
}

fn timeout_secs() -> Result<Option<u64>, AiLlmError> {
    Ok(Some(
        env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
    ))
}

/// Config for the **generation** profile of the selected provider.
///
/// # Defaults
/// - `temperature = Some(0.2)` (answers should stick to the excerpts)
pub fn config_generation() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env()?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = timeout_secs()?;

    let (endpoint, model, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, must_env("GENERATION_MODEL")?, None),
        LlmProvider::OpenAI => (
            openai_endpoint()?,
            env_opt("GENERATION_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_GENERATION_MODEL.to_string()),
            Some(must_env("OPENAI_API_KEY")?),
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs,
    })
}

/// Config for the **embedding** profile of the selected provider.
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from_env()?;
    let timeout_secs = timeout_secs()?;

    let (endpoint, model, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, must_env("EMBEDDING_MODEL")?, None),
        LlmProvider::OpenAI => (
            openai_endpoint()?,
            env_opt("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()),
            Some(must_env("OPENAI_API_KEY")?),
        ),
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs,
    })
}
