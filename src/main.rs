use std::net::TcpListener;

use anyhow::Context;
use blog::{run_app, AppContext, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let listener = TcpListener::bind(&config.bind_address)
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    let ctx = AppContext::new(config).await?;

    tracing::info!(address = %listener.local_addr()?, "server started");
    if let Err(error) = run_app(ctx, listener).await {
        tracing::error!(%error, "server stopped");
        return Err(error);
    }
    Ok(())
}
