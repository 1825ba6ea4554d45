use ai_llm_service::AiLlmError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("config error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("index is not ready; call POST /index first")]
    NotReady,

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::NotReady => "INDEX_NOT_READY",
            AppError::Http { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

impl From<AiLlmError> for AppError {
    fn from(err: AiLlmError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Pipeline errors keep their kind as a stable code.
impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        let (status, code) = match &err {
            ContextorError::CorpusEmpty(_) => (StatusCode::UNPROCESSABLE_ENTITY, "CORPUS_EMPTY"),
            ContextorError::DuplicateChunkId(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DUPLICATE_CHUNK_ID")
            }
            ContextorError::Document { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "DOCUMENT_ERROR"),
            ContextorError::ChunkingConfig(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CHUNKING_CONFIG")
            }
            ContextorError::Tokenizer(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TOKENIZER_ERROR"),
            ContextorError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            ContextorError::EmbeddingProvider(_) => (StatusCode::BAD_GATEWAY, "EMBEDDING_PROVIDER"),
            ContextorError::GenerationProvider(_) => {
                (StatusCode::BAD_GATEWAY, "GENERATION_PROVIDER")
            }
            ContextorError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            ContextorError::InvalidTopK => (StatusCode::BAD_REQUEST, "INVALID_TOP_K"),
            ContextorError::EmptyQuery => (StatusCode::BAD_REQUEST, "EMPTY_QUERY"),
            ContextorError::StaleHandle { .. } => (StatusCode::CONFLICT, "STALE_HANDLE"),
            ContextorError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            ContextorError::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "JSON_ERROR"),
        };
        AppError::Http {
            status,
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_status_and_code() {
        let e: AppError = ContextorError::EmptyQuery.into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.error_code(), "EMPTY_QUERY");

        let e: AppError = ContextorError::StoreUnavailable("refused".into()).into();
        assert_eq!(e.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(e.to_string().contains("refused"));

        let e: AppError = ContextorError::StaleHandle {
            handle: 1,
            current: 2,
        }
        .into();
        assert_eq!(e.status_code(), StatusCode::CONFLICT);
    }
}
