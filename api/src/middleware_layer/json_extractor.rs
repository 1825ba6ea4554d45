use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Request fields that a body rejection may point at.
const KNOWN_FIELDS: &[&str] = &["question", "top_k", "rebuild"];

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    KNOWN_FIELDS
        .iter()
        .find(|k| msg.contains(*k))
        .map(|k| k.to_string())
}

fn hint_for(msg: &str) -> Option<String> {
    if msg.contains("missing field") {
        Some("Add the missing field to the JSON body.".into())
    } else if msg.contains("invalid type") {
        Some("Check the field type (e.g. \"top_k\": 5, \"rebuild\": true).".into())
    } else if msg.contains("Content-Type") {
        Some("Send the body with `content-type: application/json`.".into())
    } else {
        None
    }
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(v) = HeaderValue::from_str(&id) {
        parts.headers.insert("X-Request-Id", v);
    }
    id
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Rewraps axum's plain-text body rejections (400/415/422) into the
/// [`ApiResponse`] envelope. JSON responses pass through untouched.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    let code = match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        _ => return res,
    };

    let (mut parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes).trim().to_string();
    let req_id = ensure_request_id(&mut parts);
    debug!(%req_id, %status, "body rejection mapped");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: hint_for(&original),
    };
    let details = if detail.path.is_none() && detail.hint.is_none() {
        Vec::new()
    } else {
        vec![detail]
    };

    let envelope = ApiResponse::<()>::error(code, original, details);
    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
