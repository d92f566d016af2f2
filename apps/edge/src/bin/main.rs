//! Parley edge binary entry point.
//!
//! Loads the edge configuration (first argument, defaults otherwise) and
//! serves the tenant-routed application with graceful shutdown on ctrl-c.

use anyhow::{Context, Result};
use std::path::Path;
use tenant::{EdgeConfig, TenantRouter};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = EdgeConfig::load(Path::new(&path))?;
            tracing::info!("loaded configuration from {path}");
            config
        }
        None => EdgeConfig::default(),
    };

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind))?;
    tracing::info!("edge listening on {}", config.bind);

    parley_edge::serve(listener, TenantRouter::new(config), shutdown_signal()).await?;
    tracing::info!("edge shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
