use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::status::status_response::StatusResponse,
};

/// Handler: GET /status
///
/// # Example
/// ```bash
/// curl http://127.0.0.1:8080/status
/// ```
pub async fn status_route(State(state): State<Arc<AppState>>) -> Response {
    let live = state.handle.read().await;
    let body = StatusResponse {
        collection: state.contextor.collection().to_string(),
        ready: live.is_some(),
        passages: live.as_ref().map_or(0, |h| h.passages),
        epoch: live.as_ref().map(|h| h.epoch),
    };
    ApiResponse::success(body).into_response_with_status(StatusCode::OK)
}
