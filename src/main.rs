use std::sync::Arc;

use sourcelink::config::Settings;
use sourcelink::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let settings = Arc::new(Settings::load()?);

    server::listener::run(settings, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::warn!(error = %e, "Could not install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        }
    })
    .await?;

    Ok(())
}
