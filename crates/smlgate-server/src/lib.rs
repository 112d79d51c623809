//! smlgate HTTP server.
//!
//! Binds the gateway pipeline to its three trigger sources:
//!
//! - **Routes**: inbound GET/POST requests for `.sml`/`.msp` paths
//! - **Trap**: re-entry on the trap script for unhandled pipeline failures
//! - **Scheduler**: interval, daily and weekly jobs independent of traffic

pub mod config;
pub mod error;
pub mod routes;
pub mod scheduler;

use std::net::SocketAddr;
use std::sync::Arc;

use smlgate_core::{Engine, GatewayConfig, ProcessEngine, ProjectLayout, ScriptGateway};

pub use config::ServerFileConfig;
pub use error::{ServerError, ServerResult};
pub use routes::{AppState, create_router};
pub use scheduler::{Cadence, Job};

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Start the gateway server.
pub async fn serve(
    config: ServerConfig,
    gateway_config: GatewayConfig,
    jobs: Vec<Job>,
) -> ServerResult<()> {
    let layout = ProjectLayout::new(&gateway_config.document_root, &gateway_config.project_id);
    tracing::info!(manifest = %layout.manifest_path().display(), "manifest file");
    tracing::info!(marker = %layout.marker_path().display(), "freshness marker file");

    let engine = ProcessEngine::new(&gateway_config.runtime);
    let gateway = Arc::new(ScriptGateway::new(
        layout,
        engine,
        gateway_config.extended_typing,
    ));
    if gateway_config.extended_typing {
        tracing::info!("extended typing enabled");
    }

    run_init_script(&gateway, gateway_config.init_script.as_deref()).await;

    // Job tasks live as long as the process; handles are dropped detached.
    let _job_tasks = scheduler::spawn_jobs(jobs, gateway.clone());

    let state = Arc::new(AppState {
        gateway,
        trap_path: gateway_config.trap_script().to_string(),
    });
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", config.host, config.port)))?;

    tracing::info!("serving scripts at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on ctrl-c.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Run the startup script once, if configured. Failure is logged and
/// startup continues.
async fn run_init_script<E: Engine + 'static>(
    gateway: &Arc<ScriptGateway<E>>,
    init_script: Option<&str>,
) {
    let Some(script) = init_script else {
        tracing::info!("no init script configured");
        return;
    };

    let path = script.to_string();
    let runner = gateway.clone();
    match tokio::task::spawn_blocking(move || runner.run(&path)).await {
        Ok(Ok(outcome)) => {
            tracing::info!(script, outcome = outcome.label(), "init script executed");
        }
        Ok(Err(e)) => tracing::warn!(script, error = %e, "init script failed"),
        Err(e) => tracing::error!(script, error = %e, "init script panicked"),
    }
}
