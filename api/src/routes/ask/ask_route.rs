//! POST /ask — retrieve passages and generate a grounded answer.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use tracing::{debug, instrument, warn};

use crate::{
    core::{
        app_state::AppState,
        http::response_envelope::{ApiErrorDetail, ApiResponse},
    },
    error_handler::AppError,
    routes::ask::ask_request::{AskRequest, AskResponse, SourceItem},
};

pub const MIN_TOP_K: u64 = 3;
pub const MAX_TOP_K: u64 = 10;

/// Requested (or configured) `top_k` bounded to `MIN_TOP_K..=MAX_TOP_K`.
///
/// Zero is rejected rather than raised to the lower bound.
pub fn clamp_top_k(requested: Option<u64>, default: u64) -> Result<u64, ContextorError> {
    match requested.unwrap_or(default) {
        0 => Err(ContextorError::InvalidTopK),
        k => Ok(k.clamp(MIN_TOP_K, MAX_TOP_K)),
    }
}

/// Handler: POST /ask
///
/// When generation fails the retrieved sources are still returned, together
/// with the error.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"What is the leave policy?","top_k":3}'
/// ```
#[instrument(
    name = "ask_route",
    skip_all,
    fields(collection = %state.contextor.collection())
)]
pub async fn ask_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AskRequest>,
) -> Response {
    if let Some(id) = headers.get("X-Request-Id").and_then(|h| h.to_str().ok()) {
        debug!(%id, "request id attached");
    }

    let question = body.question.trim();
    if question.is_empty() {
        let details = vec![ApiErrorDetail {
            path: Some("question".into()),
            hint: Some("Provide a non-empty question.".into()),
        }];
        return ApiResponse::<()>::error("EMPTY_QUERY", "Field `question` is empty.", details)
            .into_response_with_status(StatusCode::BAD_REQUEST);
    }

    let top_k = match clamp_top_k(body.top_k, state.contextor.default_top_k()) {
        Ok(k) => k,
        Err(err) => return AppError::from(err).into_response(),
    };

    let hits = {
        let live = state.handle.read().await;
        let Some(handle) = live.as_ref() else {
            return AppError::NotReady.into_response();
        };
        match state.contextor.retrieve(handle, question, top_k).await {
            Ok(hits) => hits,
            Err(err) => return AppError::from(err).into_response(),
        }
    };
    debug!(top_k, hits = hits.len(), "passages retrieved");

    let sources: Vec<SourceItem> = hits.iter().map(SourceItem::from).collect();

    match state.contextor.answer(question, hits).await {
        Ok(res) => ApiResponse::success(AskResponse {
            not_found: res.is_not_found(),
            citations: res.citations(),
            answer: Some(res.answer_text),
            sources,
        })
        .into_response_with_status(StatusCode::OK),
        Err(err) => {
            warn!(error = %err, "answer generation failed; returning sources only");
            let err = AppError::from(err);
            ApiResponse::partial(
                AskResponse {
                    answer: None,
                    not_found: false,
                    citations: Vec::new(),
                    sources,
                },
                err.error_code(),
                err.to_string(),
            )
            .into_response_with_status(err.status_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_is_clamped() {
        assert_eq!(clamp_top_k(None, 5).unwrap(), 5);
        assert_eq!(clamp_top_k(Some(1), 5).unwrap(), 3);
        assert_eq!(clamp_top_k(Some(50), 5).unwrap(), 10);
        assert_eq!(clamp_top_k(None, 1).unwrap(), 3);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(matches!(
            clamp_top_k(Some(0), 5),
            Err(ContextorError::InvalidTopK)
        ));
        assert!(matches!(clamp_top_k(None, 0), Err(ContextorError::InvalidTopK)));
    }
}
