pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use contextor::{Contextor, IndicatifProgress};
use tokio::signal;
use tracing::{error, info, warn};

use crate::core::app_state::{ApiConfig, AppState};
use crate::error_handler::AppError;
use crate::middleware_layer::json_extractor::json_error_mapper;
use crate::routes::{
    ask::ask_route::ask_route, index::index_route::index_route,
    status::status_route::status_route,
};

pub use routes::ask::ask_route::{MAX_TOP_K, MIN_TOP_K, clamp_top_k};

/// HTTP routes over a ready [`AppState`].
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/index", post(index_route))
        .route("/ask", post(ask_route))
        .route("/status", get(status_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Builds the pipeline from the environment, optionally indexes, then serves
/// until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let cfg = ApiConfig::from_env()?;

    let svc = Arc::new(LlmServiceProfiles::from_env()?);
    let contextor = Contextor::from_env(svc)?;
    let state = Arc::new(AppState::new(contextor));

    if cfg.index_on_start {
        index_on_start(&state).await?;
    } else {
        info!("INDEX_ON_START=false: waiting for POST /index");
    }

    let listener = tokio::net::TcpListener::bind(&cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %cfg.address, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

async fn index_on_start(state: &AppState) -> Result<(), AppError> {
    let mut live = state.handle.write().await;
    let report = state
        .contextor
        .ensure_index(false, &IndicatifProgress::bar())
        .await?;
    for w in &report.warnings {
        warn!(warning = %w, "index check");
    }
    info!(
        passages = report.passages,
        action = ?report.action,
        "index ready"
    );
    *live = Some(report.handle);
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
