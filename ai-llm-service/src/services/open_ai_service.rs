//! OpenAI service for chat generation and batched embeddings.
//!
//! Minimal, non-streaming client around the OpenAI REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions — chat completion
//! - POST {endpoint}/v1/embeddings       — embeddings for a batch of inputs
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::collections::HashSet;
use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    services::IndexedEmbedding,
};

/// Thin client for the OpenAI API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (timeout and auth headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg.timeout();

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{base}/v1/chat/completions");
        let url_embeddings = format!("{base}/v1/embeddings");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_chat,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** chat completion with a system and a user
    /// message.
    ///
    /// Mapped options from config: `model`, `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::Timeout`] / [`AiLlmError::HttpTransport`] for network failures
    /// - `Decode` if the JSON cannot be parsed
    /// - `EmptyChoices` if no choice carries content
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, system, user);

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

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/chat/completions response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = extract_chat_content(out)?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Embeds a batch of inputs via `/v1/embeddings`.
    ///
    /// The API tags every vector with `data[].index`; the tags are passed
    /// through after checking they form exactly `0..inputs.len()`.
    ///
    /// # Errors
    /// Transport/status/decode errors as for [`OpenAiService::chat`], plus
    /// `Pairing` when indexes are missing, duplicated or out of range.
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<IndexedEmbedding>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!("POST {}", self.url_embeddings);

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_embeddings, started).await);
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            error!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode /v1/embeddings response"
            );
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `data[].{{index, embedding}}`"
                )),
            )
        })?;

        let tagged = check_indexes(out, inputs.len())?;

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
            "OpenAI returned non-success status"
        );

        ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into()
    }
}

fn extract_chat_content(out: ChatCompletionResponse) -> Result<String, AiLlmError> {
    out.choices
        .into_iter()
        .find_map(|c| c.message.content.filter(|s| !s.trim().is_empty()))
        .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices).into())
}

fn check_indexes(
    out: EmbeddingsResponse,
    expected: usize,
) -> Result<Vec<IndexedEmbedding>, AiLlmError> {
    let pairing = |msg: String| -> AiLlmError {
        ProviderError::new(Provider::OpenAI, ProviderErrorKind::Pairing(msg)).into()
    };

    if out.data.len() != expected {
        return Err(pairing(format!(
            "expected {expected} vectors, got {}",
            out.data.len()
        )));
    }

    let mut seen = HashSet::with_capacity(expected);
    let mut tagged = Vec::with_capacity(expected);
    for item in out.data {
        if item.index >= expected {
            return Err(pairing(format!(
                "index {} out of range for batch of {expected}",
                item.index
            )));
        }
        if !seen.insert(item.index) {
            return Err(pairing(format!("duplicate index {}", item.index)));
        }
        tagged.push(IndexedEmbedding {
            index: item.index,
            vector: item.embedding,
        });
    }
    Ok(tagged)
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
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
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: Some("sk-test".into()),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn missing_key_is_rejected() {
        let mut c = cfg();
        c.api_key = None;
        assert!(matches!(
            OpenAiService::new(c),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::MissingApiKey,
                ..
            }))
        ));
    }

    #[test]
    fn chat_request_has_system_then_user() {
        let c = cfg();
        let v = serde_json::to_value(ChatCompletionRequest::from_cfg(&c, "rules", "q")).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "q");
        assert!(v.get("max_tokens").is_none());
    }

    #[test]
    fn out_of_order_indexes_are_kept() {
        let out: EmbeddingsResponse = serde_json::from_value(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        }))
        .unwrap();
        let tagged = check_indexes(out, 2).unwrap();
        assert_eq!(tagged[0].index, 1);
        assert_eq!(tagged[1].vector, vec![1.0, 0.0]);
    }

    #[test]
    fn duplicate_or_out_of_range_indexes_fail() {
        let dup: EmbeddingsResponse = serde_json::from_value(json!({
            "data": [
                { "index": 0, "embedding": [0.0] },
                { "index": 0, "embedding": [1.0] }
            ]
        }))
        .unwrap();
        assert!(check_indexes(dup, 2).is_err());

        let oob: EmbeddingsResponse = serde_json::from_value(json!({
            "data": [{ "index": 5, "embedding": [0.0] }]
        }))
        .unwrap();
        assert!(check_indexes(oob, 1).is_err());
    }

    #[test]
    fn null_content_is_empty_choice() {
        let out: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        }))
        .unwrap();
        assert!(matches!(
            extract_chat_content(out),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::EmptyChoices,
                ..
            }))
        ));
    }
}
