//! Formatting layer shared by the workspace binaries.
//!
//! Events are rendered with RFC3339 UTC timestamps; only targets that belong
//! to this workspace pass the layer's filter, so chatty dependencies
//! (hyper, h2, tonic) stay out of the output regardless of the global level.

use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix of this library.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// Targets rendered by [`layer`]: every crate of the workspace.
pub const WORKSPACE_TARGETS: &[&str] = &[
    TARGET_PREFIX,
    "passage_prep",
    "rag_store",
    "contextor",
    "api",
    "doc_rag",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact single-line layer restricted to [`WORKSPACE_TARGETS`].
///
/// Span close events are logged so `#[instrument]`ed provider calls report
/// their duration. ANSI colors only when stdout is a terminal.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    layer_for(WORKSPACE_TARGETS)
}

/// Same as [`layer`] for an explicit list of target prefixes.
pub fn layer_for<S>(prefixes: &'static [&'static str]) -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_ours = filter::filter_fn(move |meta| {
        prefixes.iter().any(|p| meta.target().starts_with(p))
    });

    let format = fmt::format()
        .compact()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_source_location(true);

    fmt::layer()
        .event_format(format)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_filter(only_ours)
}

/// `RUST_LOG` if set, otherwise `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
