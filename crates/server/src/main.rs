//! shellcache server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheEvent, FetchClient, FetchConfig, LifecycleController, Router, RouterConfig};
use shellcache_core::{AppConfig, CacheDb};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

/// Forward router events to the log until every sender is gone.
async fn log_events(mut events: mpsc::UnboundedReceiver<CacheEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            CacheEvent::Stored { store, url } => tracing::debug!(%store, %url, "cache event: stored"),
            CacheEvent::WriteFailed { store, url, error } => {
                tracing::warn!(%store, %url, %error, "cache event: write failed")
            }
            CacheEvent::StoreDeleted { store } => tracing::info!(%store, "cache event: store deleted"),
            CacheEvent::DeleteFailed { store, error } => tracing::warn!(%store, %error, "cache event: delete failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        shell_store = %config.shell_store,
        runtime_store = %config.runtime_store,
        db = %config.db_path.display(),
        "starting shellcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let router_config = RouterConfig::from_app_config(&config)?;

    let (router, events) = Router::with_events(router_config, Arc::new(db), Arc::new(network));
    let event_log = tokio::spawn(log_events(events));

    let host = Arc::new(host::ServerHost::new());
    let controller = Arc::new(LifecycleController::new(Arc::new(router), host.clone()));

    let handler = handler::ShellcacheServer::new(Arc::clone(&controller), host);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    tracing::info!(pending = controller.router().pending_writes(), "draining cache writes");
    controller.retire().await;
    event_log.abort();

    Ok(())
}
