//! Request bodies, framed only by `Content-Length`.

use tokio::io::AsyncRead;

use crate::http::error::HttpError;
use crate::http::headers::{Headers, CONTENT_LENGTH};
use crate::http::scanner::Scanner;

/// Declared body length, if any.
///
/// A value that is not a non-negative integer is `411 Length Required`.
pub fn content_length(headers: &Headers) -> Result<Option<usize>, HttpError> {
    let Some(raw) = headers.value(CONTENT_LENGTH) else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(len) => Ok(Some(len)),
        Err(_) => {
            tracing::info!(value = %raw, "Invalid Content-Length header value");
            Err(HttpError::LengthRequired(raw.to_string()))
        }
    }
}

/// Read exactly the declared number of body bytes (none if undeclared).
pub async fn read_body<R>(scanner: &mut Scanner<R>, headers: &Headers) -> Result<Vec<u8>, HttpError>
where
    R: AsyncRead + Unpin,
{
    let Some(len) = content_length(headers)? else {
        return Ok(Vec::new());
    };
    tracing::trace!(content_length = len, "Reading request body");

    scanner.read_exact(len).await.map_err(|e| {
        tracing::error!(error = %e, "Failed reading the body content");
        HttpError::from(e)
    })
}
