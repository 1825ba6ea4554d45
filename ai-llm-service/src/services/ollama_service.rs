//! Lightweight Ollama client for chat generation and batched embeddings.
//!
//! Endpoints derived from `LlmModelConfig::endpoint`:
//! - `POST {endpoint}/api/chat`  — non-streaming chat (`stream=false`)
//! - `POST {endpoint}/api/embed` — batched embeddings (`input: [..]`)
//!
//! `/api/embed` returns `embeddings` in input order; each vector is tagged
//! with its position so callers can pair them explicitly.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    services::IndexedEmbedding,
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]; reuses one HTTP client with
/// the configured timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{base}/api/chat");
        let url_embed = format!("{base}/api/embed");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_chat,
            url_embed,
        })
    }

    /// Performs a **non-streaming** chat request via `/api/chat`.
    ///
    /// Mapped options: `temperature`, `top_p`, `num_predict` ← `max_tokens`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::Timeout`] / [`AiLlmError::HttpTransport`] for client failures
    /// - `Decode` if the response cannot be parsed, `EmptyChoices` if the
    ///   message is blank
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, system, user);

        debug!(user_len = user.len(), "POST {}", self.url_chat);
        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_chat, started).await);
        }

        let out: ChatResponse = resp.json().await.map_err(|e| {
            error!(error = %e, latency_ms = started.elapsed().as_millis(), "failed to decode /api/chat response");
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `message.content` with `stream=false`"
                )),
            )
        })?;

        let content = extract_chat_content(out)?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = content.len(),
            "chat completed"
        );
        Ok(content)
    }

    /// Embeds a batch of texts via `/api/embed`.
    ///
    /// # Errors
    /// Same transport/status/decode errors as [`OllamaService::chat`], plus
    /// `Pairing` if the number of vectors differs from the number of inputs.
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<IndexedEmbedding>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let body = EmbedRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!("POST {}", self.url_embed);
        let resp = self
            .client
            .post(&self.url_embed)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_embed, started).await);
        }

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embeddings: number[][] }}`"
                )),
            )
        })?;

        let tagged = tag_embeddings(out, inputs.len())?;

        debug!(
            latency_ms = started.elapsed().as_millis(),
            vectors = tagged.len(),
            "embeddings completed"
        );
        Ok(tagged)
    }

    async fn status_error(
        &self,
        resp: reqwest::Response,
        url: &str,
        started: Instant,
    ) -> AiLlmError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "Ollama returned non-success status"
        );

        ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into()
    }
}

fn extract_chat_content(out: ChatResponse) -> Result<String, AiLlmError> {
    match out.message {
        Some(m) if !m.content.trim().is_empty() => Ok(m.content),
        _ => Err(ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices).into()),
    }
}

fn tag_embeddings(out: EmbedResponse, expected: usize) -> Result<Vec<IndexedEmbedding>, AiLlmError> {
    if out.embeddings.len() != expected {
        return Err(ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::Pairing(format!(
                "expected {expected} vectors, got {}",
                out.embeddings.len()
            )),
        )
        .into());
    }
    Ok(out
        .embeddings
        .into_iter()
        .enumerate()
        .map(|(index, vector)| IndexedEmbedding { index, vector })
        .collect())
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, system: &'a str, user: &'a str) -> Self {
        Self {
            model: &cfg.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                num_predict: cfg.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessageOut>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    #[serde(default)]
    content: String,
}

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body for `/api/embed`.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.1:8b".into(),
            endpoint: "http://localhost:11434/".into(),
            api_key: None,
            max_tokens: Some(512),
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn chat_request_shape() {
        let cfg = cfg();
        let body = serde_json::to_value(ChatRequest::from_cfg(&cfg, "sys", "question")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3.1:8b",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "question" }
                ],
                "stream": false,
                "options": { "temperature": 0.2f32, "num_predict": 512 }
            })
        );
    }

    #[test]
    fn rejects_foreign_provider_and_bad_endpoint() {
        let mut c = cfg();
        c.provider = LlmProvider::OpenAI;
        assert!(matches!(
            OllamaService::new(c),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidProvider,
                ..
            }))
        ));

        let mut c = cfg();
        c.endpoint = "localhost:11434".into();
        assert!(matches!(
            OllamaService::new(c),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidEndpoint(_),
                ..
            }))
        ));
    }

    #[test]
    fn urls_are_normalized() {
        let svc = OllamaService::new(cfg()).unwrap();
        assert_eq!(svc.url_chat, "http://localhost:11434/api/chat");
        assert_eq!(svc.url_embed, "http://localhost:11434/api/embed");
    }

    #[test]
    fn embeddings_are_tagged_by_position() {
        let out: EmbedResponse =
            serde_json::from_value(json!({ "embeddings": [[1.0, 0.0], [0.0, 1.0]] })).unwrap();
        let tagged = tag_embeddings(out, 2).unwrap();
        assert_eq!(tagged[0].index, 0);
        assert_eq!(tagged[1].vector, vec![0.0, 1.0]);
    }

    #[test]
    fn embedding_count_mismatch_is_pairing_error() {
        let out: EmbedResponse =
            serde_json::from_value(json!({ "embeddings": [[1.0, 0.0]] })).unwrap();
        assert!(matches!(
            tag_embeddings(out, 3),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::Pairing(_),
                ..
            }))
        ));
    }

    #[test]
    fn blank_chat_message_is_empty_choice() {
        let out: ChatResponse =
            serde_json::from_value(json!({ "message": { "role": "assistant", "content": " " } }))
                .unwrap();
        assert!(extract_chat_content(out).is_err());
    }
}
