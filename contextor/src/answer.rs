//! Grounded answer generation over retrieved passages.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::future::BoxFuture;
use rag_store::RetrievalHit;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ContextorError;
use crate::prompt::{NOT_FOUND_REPLY, SYSTEM_PROMPT, build_user_prompt};

/// Chat completion seam: `(system, user) -> text`.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, ContextorError>>;

    fn model_id(&self) -> &str;
}

impl TextGenerator for LlmServiceProfiles {
    fn generate<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, ContextorError>> {
        Box::pin(async move {
            LlmServiceProfiles::generate(self, system, user)
                .await
                .map_err(|e| ContextorError::GenerationProvider(e.to_string()))
        })
    }

    fn model_id(&self) -> &str {
        &self.profiles().0.model
    }
}

/// A `(Source, page N)` reference found in an answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub source: String,
    pub page: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerResult {
    /// Model output, unmodified.
    pub answer_text: String,
    /// Passages the answer was generated from, in ranking order.
    pub hits: Vec<RetrievalHit>,
}

impl AnswerResult {
    /// `(Source, page N)` citations in order of appearance.
    ///
    /// Accepts `page N`, `p. N` and `pN`, case-insensitively.
    pub fn citations(&self) -> Vec<Citation> {
        let mut out = Vec::new();
        if let Ok(re) = Regex::new(r"(?i)\(([^()]+?),\s*(?:page|p\.?)\s*(\d+)\)") {
            for cap in re.captures_iter(&self.answer_text) {
                let Ok(page) = cap[2].parse::<u32>() else {
                    continue;
                };
                let c = Citation {
                    source: cap[1].trim().to_string(),
                    page,
                };
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Hits whose source and page match a citation.
    pub fn cited_hits(&self) -> Vec<&RetrievalHit> {
        let cites = self.citations();
        self.hits
            .iter()
            .filter(|h| {
                cites.iter().any(|c| {
                    c.page == h.metadata.page && c.source.eq_ignore_ascii_case(&h.metadata.source)
                })
            })
            .collect()
    }

    /// True when the model gave the fixed fallback reply.
    pub fn is_not_found(&self) -> bool {
        self.answer_text.contains(NOT_FOUND_REPLY)
    }
}

/// One generation call per question; no streaming, no retry.
#[derive(Clone)]
pub struct Answerer {
    generator: Arc<dyn TextGenerator>,
}

impl Answerer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generates an answer grounded in `hits`.
    ///
    /// Empty `hits` still calls the model; the instructions make it reply
    /// with the fallback phrase.
    ///
    /// # Errors
    /// `EmptyQuery` for a blank query, `GenerationProvider` when the call
    /// fails (the caller still owns `hits`).
    #[instrument(skip_all, fields(model = %self.generator.model_id(), hits = hits.len()))]
    pub async fn answer(
        &self,
        query: &str,
        hits: Vec<RetrievalHit>,
    ) -> Result<AnswerResult, ContextorError> {
        if query.trim().is_empty() {
            return Err(ContextorError::EmptyQuery);
        }
        let user = build_user_prompt(query, &hits);
        let answer_text = self.generator.generate(SYSTEM_PROMPT, &user).await?;
        debug!(
            target: "contextor::answer",
            chars = answer_text.len(),
            "answer generated"
        );
        Ok(AnswerResult { answer_text, hits })
    }
}
