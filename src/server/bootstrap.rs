use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::store::{BalanceLedger, SessionStore};

use super::routes::GameServer;
use super::session::{SessionHandle, SessionServiceConfig};

const LOG_TARGET: &str = "andar_bahar::server::bootstrap";

pub struct ServerConfig {
    pub bind: SocketAddr,
    pub command_capacity: usize,
    pub broadcast_capacity: usize,
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn SessionStore>,
    balances: Arc<dyn BalanceLedger>,
) -> Result<()> {
    let session = SessionHandle::spawn(SessionServiceConfig {
        store,
        balances,
        command_capacity: config.command_capacity,
        broadcast_capacity: config.broadcast_capacity,
    })
    .await;

    let router = GameServer::new(session).into_router();
    let make_service = router.into_make_service();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(target: LOG_TARGET, %local_addr, "andar bahar server listening");

    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")
}

async fn shutdown_signal() {
    use tracing::warn;

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: LOG_TARGET, %err, "failed to install ctrl-c handler");
    }
    info!(target: LOG_TARGET, "shutdown signal received");
}
