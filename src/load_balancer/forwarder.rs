//! Relays one request to a backend and its response back to the client.
//!
//! # Relay order
//! ```text
//! client ──▶ start line (context stripped) ──▶ backend
//!        ──▶ headers (affinity cookie removed)
//!        ──▶ Content-Length body
//! backend ──▶ status line, byte for byte ──▶ client
//!         ──▶ headers (Set-Cookie rewritten)
//!         ──▶ body, Content-Length or chunks until a short read / EOF
//! ```
//!
//! A backend connection is opened per request and dropped when it is done.
//! There is no retry: if the chosen backend cannot be reached the request
//! fails with 500 and the client connection is closed by the caller.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::http::body::content_length;
use crate::http::error::HttpError;
use crate::http::headers::{parse_headers, Headers};
use crate::http::method::Method;
use crate::http::scanner::{Scanner, LF};
use crate::http::start_line::StartLine;
use crate::load_balancer::affinity::{Affinity, AffinityState, Assignment};
use crate::load_balancer::cookie::AFFINITY_COOKIE;

/// Chunk size when copying a request body to the backend.
pub const READ_REQ_LEN: usize = 1024;

/// Chunk size when streaming a response body back to the client.
pub const READ_PROXY_LEN: usize = 2048;

/// Forwards proxied requests, sharing one [`AffinityState`] across workers.
#[derive(Debug, Clone)]
pub struct Forwarder {
    affinity: Arc<AffinityState>,
    backend_host: String,
}

impl Forwarder {
    pub fn new(affinity: Arc<AffinityState>, backend_host: impl Into<String>) -> Self {
        Self {
            affinity,
            backend_host: backend_host.into(),
        }
    }

    pub fn affinity(&self) -> &Arc<AffinityState> {
        &self.affinity
    }

    /// Proxy one request whose start line and headers are already parsed.
    ///
    /// The request body, if any, is still unread in `client_in`.
    pub async fn forward<R, W>(
        &self,
        client_in: &mut Scanner<R>,
        client_out: &mut W,
        start_line: &StartLine,
        mut headers: Headers,
        context: &str,
        ports: &[u16],
    ) -> Result<(), HttpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // a bad length must fail before any backend sees the request
        let body_len = content_length(&headers)?;

        let assignment = self
            .affinity
            .assign(context, ports, headers.cookie(AFFINITY_COOKIE))?;
        tracing::debug!(
            context = %context,
            port = assignment.port,
            affinity = ?assignment.affinity,
            "Selected backend"
        );

        let backend = TcpStream::connect((self.backend_host.as_str(), assignment.port))
            .await
            .map_err(|e| {
                tracing::error!(context = %context, port = assignment.port, error = %e, "Backend dial failed");
                HttpError::from(e)
            })?;
        let (backend_read, mut backend_out) = backend.into_split();
        let mut backend_in = Scanner::new(backend_read);

        // backends never see the load balancer's own cookie
        headers.delete_cookie(AFFINITY_COOKIE);
        let head = format!(
            "{}\r\n{}\r\n",
            start_line.render(Some(context)),
            headers.render()
        );
        tracing::trace!(request = %head, "Writing request head to backend");
        backend_out.write_all(head.as_bytes()).await?;

        if let Some(len) = body_len {
            tracing::trace!(content_length = len, "Forwarding request body");
            copy_exact(client_in, &mut backend_out, len, READ_REQ_LEN).await?;
        }
        backend_out.flush().await?;

        let status = relay_status_line(&mut backend_in, client_out).await?;

        let mut response_headers = parse_headers(&mut backend_in).await?;
        rewrite_affinity(&mut response_headers, &assignment);
        let head = format!("{}\r\n", response_headers.render());
        client_out.write_all(head.as_bytes()).await?;

        if response_has_body(start_line.method, status) {
            match content_length(&response_headers).ok().flatten() {
                Some(len) => copy_exact(&mut backend_in, client_out, len, READ_PROXY_LEN).await?,
                None => stream_until_short_read(&mut backend_in, client_out).await?,
            }
        }
        client_out.flush().await?;

        tracing::debug!(
            request = %start_line.render(Some(context)),
            port = assignment.port,
            "Completed proxied response"
        );
        Ok(())
    }
}

/// Put the affinity cookie on the response when the client needs a new one.
pub fn rewrite_affinity(headers: &mut Headers, assignment: &Assignment) {
    match &assignment.affinity {
        Affinity::Fresh => headers.set_cookie(AFFINITY_COOKIE, &assignment.token),
        Affinity::Stale { .. } => {
            headers.expire_cookie(AFFINITY_COOKIE);
            headers.set_cookie(AFFINITY_COOKIE, &assignment.token);
        }
        Affinity::Sticky | Affinity::Joined => {}
    }
}

/// Copy the backend's status line to the client, LF included.
///
/// Returns the status code if the line carried a parsable one.
async fn relay_status_line<R, W>(backend_in: &mut Scanner<R>, client_out: &mut W) -> Result<Option<u16>, HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::with_capacity(32);
    loop {
        match backend_in.next_byte().await? {
            Some(byte) => {
                line.push(byte);
                if byte == LF {
                    break;
                }
            }
            None if line.is_empty() => {
                return Err(HttpError::InternalServerError(
                    "backend closed the connection without responding".into(),
                ))
            }
            None => break,
        }
    }
    client_out.write_all(&line).await?;

    let status = String::from_utf8_lossy(&line)
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok());
    Ok(status)
}

/// HEAD responses and 1xx/204/304 never carry a body.
fn response_has_body(method: Method, status: Option<u16>) -> bool {
    if method == Method::Head {
        return false;
    }
    !matches!(status, Some(100..=199) | Some(204) | Some(304))
}

/// Move exactly `len` bytes from `from` to `to`.
async fn copy_exact<R, W>(from: &mut Scanner<R>, to: &mut W, len: usize, chunk: usize) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk.min(len.max(1))];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(buf.len());
        let read = from.read(&mut buf[..want]).await?;
        if read == 0 {
            return Err(HttpError::InternalServerError(format!(
                "connection closed with {} of {} body bytes outstanding",
                remaining, len
            )));
        }
        to.write_all(&buf[..read]).await?;
        remaining -= read;
    }
    Ok(())
}

/// Stream an unframed body until a short read or EOF.
///
/// Every read counts, including one served from bytes the header parser
/// already buffered, so a backend that holds its socket open after a small
/// body does not stall the client.
async fn stream_until_short_read<R, W>(from: &mut Scanner<R>, to: &mut W) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; READ_PROXY_LEN];
    loop {
        let read = from.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        to.write_all(&buf[..read]).await?;
        tracing::trace!(bytes = read, "Relayed response chunk");
        if read < READ_PROXY_LEN {
            break;
        }
    }
    Ok(())
}
