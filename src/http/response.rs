//! Responses produced locally (files and errors).
//!
//! Proxied responses are relayed byte for byte by the forwarder and never pass
//! through here.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::error::HttpError;

/// `HTTP/1.1 <code> <reason>\r\n`
pub fn status_line(code: u16, reason: &str) -> String {
    format!("HTTP/1.1 {} {}\r\n", code, reason)
}

/// Write a `200 OK` carrying `body`.
pub async fn write_ok<W>(writer: &mut W, mime_type: &str, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "{}Content-Type: {}\r\nContent-Length: {}\r\n\r\n",
        status_line(200, "OK"),
        mime_type,
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await
}

/// Write a status-line-only response for `err`.
pub async fn write_error<W>(writer: &mut W, err: &HttpError) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = format!("{}\r\n", status_line(err.status(), err.reason()));
    writer.write_all(head.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_response_is_status_line_only() {
        let mut out = Vec::new();
        write_error(&mut out, &HttpError::MethodNotAllowed("FOO".into()))
            .await
            .unwrap();
        assert_eq!(out, b"HTTP/1.1 405 Method Not Allowed\r\n\r\n");
    }

    #[tokio::test]
    async fn ok_response_carries_type_and_length() {
        let mut out = Vec::new();
        write_ok(&mut out, "text/html", b"<p>hi</p>").await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 9\r\n\r\n<p>hi</p>"
        );
    }
}
