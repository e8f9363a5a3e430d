//! Daemon server
//!
//! Wires configuration, engine, access gate and router together and serves the
//! control plane until shutdown is requested.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::access::{AccessGate, FileAccessGate};
use crate::api;
use crate::config::Config;
use crate::service::{RunEngine, RunRegistry};
use crate::state::AppState;

/// A configured daemon, ready to bind
pub struct Daemon {
    config: Config,
    state: AppState,
}

impl Daemon {
    /// Builds a daemon with git fetching and the on-disk access configuration
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(RunRegistry::new());
        let engine = Arc::new(RunEngine::from_config(&config, registry));
        let access = Arc::new(FileAccessGate::new(config.access_config_path()));

        Self::with_parts(config, engine, access)
    }

    /// Builds a daemon from explicit parts
    pub fn with_parts(config: Config, engine: Arc<RunEngine>, access: Arc<dyn AccessGate>) -> Self {
        Self {
            config,
            state: AppState::new(engine, access),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Binds the control-plane listener
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", self.config.bind_addr))
    }

    /// Serves requests on `listener` until shutdown, then waits for runs to finish
    ///
    /// Shutdown is triggered by an authorized `GET /kill` or by Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr: SocketAddr = listener.local_addr().context("Listener has no address")?;
        tracing::info!("Listening on {}", addr);

        let app = api::create_router(self.state.clone());
        let state = self.state.clone();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(state))
            .await
            .context("Control plane server failed")?;

        tracing::info!("Listener closed, draining runs");
        self.state.engine.drain().await;
        tracing::info!("Daemon stopped");

        Ok(())
    }

    /// Validates the configuration, binds and serves
    pub async fn run(self) -> anyhow::Result<()> {
        self.config.validate().context("Invalid daemon configuration")?;

        tracing::info!(
            "Starting Chief daemon (workspaces: {}, retention: {}, max concurrent runs: {})",
            self.config.workspace_root.display(),
            self.config.retention,
            self.config.max_concurrent_runs
        );

        let listener = self.bind().await?;
        self.serve(listener).await
    }
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = state.shutdown_requested() => tracing::info!("Shutdown requested over the control plane"),
        _ = ctrl_c => {
            tracing::info!("Received Ctrl-C");
            state.request_shutdown();
        }
    }
}
