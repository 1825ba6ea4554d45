use ai_llm_service::telemetry;
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file; a missing file is fine,
    // the process environment still applies.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(telemetry::env_filter("info,contextor=debug"))
        .with(telemetry::layer())
        .try_init()
        .context("installing tracing subscriber")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), ".env loaded"),
        Err(e) if e.not_found() => warn!("no .env file; using process environment"),
        Err(e) => return Err(e).context("reading .env"),
    }

    api::start().await.context("api server")?;

    Ok(())
}
