use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::lib::{
    config::types::Config,
    containers::types::DockerClient,
    reconciler::types::{Reconciler, Restarter},
};

mod lib {
    pub mod config;
    pub mod containers;
    pub mod debounce;
    pub mod reconciler;
    pub mod sync;
    pub mod template;
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().context("Invalid configuration")?;
    info!("Starting with config {}", serde_json::to_string(&config)?);

    let docker = Arc::new(DockerClient::new().context("Failed to connect to Docker")?);
    let restarter = Restarter::resolve(docker.clone(), config.container_to_restart.as_deref())
        .await
        .context("Failed to look up the container to restart")?;

    let mut reconciler = Reconciler::new(docker, &config, restarter);
    reconciler
        .run(shutdown_signal())
        .await
        .context("Reconciler stopped")?;

    info!("Shut down cleanly ({:?})", reconciler.phase());
    Ok(())
}
