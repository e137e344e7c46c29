use anyhow::Context;
use clap::Parser;
use docuhub_server::config::{Cli, ServerConfig};
use docuhub_server::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; RUST_LOG overrides the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("docuhub_server=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_cli(&cli).context("loading configuration")?;
    if config.tokens.is_empty() {
        warn!("No bearer tokens configured; every file request will be rejected");
    }

    let state = AppState::from_config(&config).context("initializing storage")?;
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(
        "docuhub-server {} listening on {} (public URL {})",
        VERSION,
        listener.local_addr()?,
        config.public_url()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("docuhub-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
