//! POST /index — make the collection ready and publish a fresh handle.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use contextor::NoopProgress;
use tracing::{debug, error, info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppError,
    routes::index::index_request::{IndexRequest, IndexResponse},
};

/// Handler: POST /index
///
/// Holds the handle write lock for the whole run, so no query overlaps it.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/index \
///   -H 'content-type: application/json' \
///   -d '{"rebuild":false}'
/// ```
#[instrument(
    name = "index_route",
    skip_all,
    fields(collection = %state.contextor.collection())
)]
pub async fn index_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<IndexRequest>,
) -> Response {
    if let Some(id) = headers.get("X-Request-Id").and_then(|h| h.to_str().ok()) {
        debug!(%id, "request id attached");
    }

    let mut live = state.handle.write().await;
    info!(rebuild = body.rebuild, "index run requested");

    match state.contextor.ensure_index(body.rebuild, &NoopProgress).await {
        Ok(report) => {
            *live = Some(report.handle.clone());
            ApiResponse::success(IndexResponse::from(report))
                .into_response_with_status(StatusCode::OK)
        }
        Err(err) => {
            // A failed run may still have advanced the epoch.
            if live
                .as_ref()
                .is_some_and(|h| state.contextor.indexer().check_handle(h).is_err())
            {
                *live = None;
            }
            error!(error = %err, "index run failed");
            AppError::from(err).into_response()
        }
    }
}
