//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener for a validated configuration
//! - Build the server and its shared load-balancer state
//! - Run until Ctrl-C, then drain

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{Listener, ListenerError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Serve `config` until Ctrl-C.
pub async fn start(config: ServerConfig) -> Result<(), StartupError> {
    tracing::info!(
        port = config.port,
        root = %config.root.display(),
        virtual_hosts = ?config.virtual_hosts,
        proxy_contexts = ?config.proxy_contexts,
        "Final configuration"
    );

    let listener = Listener::bind(&config.bind_address(), config.max_connections).await?;
    let server = HttpServer::new(&config);

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        signals::shutdown_on_ctrl_c(&signal_shutdown).await;
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}
