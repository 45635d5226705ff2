mod telemetry;

use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file when present.
    let dotenv = dotenvy::dotenv();

    let filter = telemetry::env_filter_with_level("info", Level::DEBUG)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(telemetry::layer())
        .try_init()?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => info!("no .env file; using process environment"),
        Err(err) => warn!(error = %err, "failed to read .env"),
    }

    api::start().await?;

    Ok(())
}
