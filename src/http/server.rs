//! HTTP server: accept loop and per-connection request loop.
//!
//! # Responsibilities
//! - Accept connections and spawn one task per connection
//! - Per connection: parse start line → parse headers → resolve route →
//!   forward or serve a file → repeat until EOF or error
//! - Turn any failure into a status-line-only response, then close
//! - Stop accepting on shutdown and drain live connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::files;
use crate::http::body::read_body;
use crate::http::error::HttpError;
use crate::http::headers::parse_headers;
use crate::http::response::{write_error, write_ok};
use crate::http::scanner::Scanner;
use crate::http::start_line::parse_start_line;
use crate::load_balancer::{AffinityState, Forwarder};
use crate::net::{ConnectionGuard, ConnectionTracker, Listener, ListenerError};
use crate::routing::{Route, Router};

/// How long shutdown waits for open connections.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// State shared by every connection task.
#[derive(Debug, Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub forwarder: Forwarder,
}

/// The front-door server.
#[derive(Debug)]
pub struct HttpServer {
    state: AppState,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a server with fresh load-balancer state.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_affinity(config, Arc::new(AffinityState::new()))
    }

    /// Create a server around existing load-balancer state.
    pub fn with_affinity(config: &ServerConfig, affinity: Arc<AffinityState>) -> Self {
        let state = AppState {
            router: Arc::new(Router::from_config(config)),
            forwarder: Forwarder::new(affinity, config.backend_host.clone()),
        };
        Self {
            state,
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn affinity(&self) -> &Arc<AffinityState> {
        self.state.forwarder.affinity()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(address = %addr, "HTTP server starting");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer, permit)) => {
                            let guard = self.tracker.track();
                            let state = self.state.clone();
                            let span = tracing::info_span!(
                                "connection",
                                connection_id = %guard.id(),
                                peer_addr = %peer
                            );
                            tokio::spawn(
                                async move {
                                    handle_connection(stream, peer, state, guard).await;
                                    drop(permit);
                                }
                                .instrument(span),
                            );
                        }
                        Err(ListenerError::Accept(e)) => {
                            tracing::error!(error = %e, "Error accepting connection");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        if !self.tracker.drain(SHUTDOWN_GRACE).await {
            tracing::warn!(
                open_connections = self.tracker.active_count(),
                "Connections still open after shutdown grace period"
            );
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: AppState, _guard: ConnectionGuard) {
    tracing::info!(peer_addr = %peer, "Handling connection");
    let (read_half, mut write_half) = stream.into_split();
    let mut scanner = Scanner::new(read_half);
    serve_connection(&mut scanner, &mut write_half, &state).await;
}

/// Run the request loop on one connection until EOF or the first error.
pub async fn serve_connection<R, W>(scanner: &mut Scanner<R>, out: &mut W, state: &AppState)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        match serve_request(scanner, out, state).await {
            Ok(true) => tracing::debug!("Request processed successfully"),
            Ok(false) => {
                tracing::debug!("Client closed the connection");
                break;
            }
            Err(err) => {
                tracing::warn!(
                    status = err.status(),
                    cause = %err.cause(),
                    "Request failed, closing connection"
                );
                if let Err(e) = write_error(out, &err).await {
                    tracing::debug!(error = %e, "Could not deliver error response");
                }
                break;
            }
        }
    }
}

/// Handle one request. `Ok(false)` means the client is gone.
async fn serve_request<R, W>(scanner: &mut Scanner<R>, out: &mut W, state: &AppState) -> Result<bool, HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(start_line) = parse_start_line(scanner).await? else {
        return Ok(false);
    };
    let headers = parse_headers(scanner).await?;

    match state.router.resolve(&start_line.resource)? {
        Route::Proxy { context, ports } => {
            tracing::debug!(context = %context, resource = %start_line.resource, "Proxying request");
            state
                .forwarder
                .forward(scanner, out, &start_line, headers, &context, &ports)
                .await?;
        }
        Route::Local(path) => {
            // body is drained so the next request starts on a clean line
            let body = read_body(scanner, &headers).await?;
            tracing::trace!(body_len = body.len(), "Consumed request body");

            let file = files::load(&path).await?;
            tracing::debug!(path = %path.display(), mime_type = %file.mime_type, "Serving file");
            write_ok(out, &file.mime_type, &file.bytes).await?;
        }
    }
    Ok(true)
}
