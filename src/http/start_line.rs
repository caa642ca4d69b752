//! Request-line parsing.
//!
//! # State machine
//! ```text
//! Method ──SP──▶ Resource ──SP──▶ Version ──SP──▶ Version (overwrite) ...
//!    │              │                │
//!    └──────────────┴──── CR ────────┴──▶ (token closed)  ── LF ──▶ done
//! ```
//! A line that closes before any method byte is a blank line and is skipped.

use std::fmt;

use tokio::io::AsyncRead;

use crate::http::error::HttpError;
use crate::http::method::Method;
use crate::http::scanner::{Scanner, CR, LF, SP};

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartLine {
    pub method: Method,
    pub resource: String,
    pub version: String,
}

impl StartLine {
    /// Wire form, with `prefix` removed from the front of the resource.
    ///
    /// A result that is empty or only a query gains a leading `/`, so `/api`
    /// forwards as `/` and `/api?x=1` as `/?x=1`.
    pub fn render(&self, prefix: Option<&str>) -> String {
        let mut resource = self.resource.as_str();
        if let Some(prefix) = prefix {
            resource = resource.strip_prefix(prefix).unwrap_or(resource);
        }
        if resource.is_empty() || resource.starts_with('?') {
            return format!("{} /{} {}", self.method, resource, self.version);
        }
        format!("{} {} {}", self.method, resource, self.version)
    }
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Which token the next byte belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Method,
    Resource,
    Version,
}

/// Incremental request-line parser; feed it one byte at a time.
#[derive(Debug)]
pub struct StartLineParser {
    part: Part,
    token: Vec<u8>,
    method: Option<Method>,
    resource: String,
    version: String,
}

impl Default for StartLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StartLineParser {
    pub fn new() -> Self {
        Self {
            part: Part::Method,
            token: Vec::with_capacity(64),
            method: None,
            resource: String::new(),
            version: String::new(),
        }
    }

    /// True once any byte of a request has been seen.
    pub fn in_progress(&self) -> bool {
        self.method.is_some() || !self.token.is_empty()
    }

    /// Advance by one byte. Returns the line once its LF arrives.
    pub fn feed(&mut self, byte: u8) -> Result<Option<StartLine>, HttpError> {
        match byte {
            SP => self.close_token(false)?,
            CR => self.close_token(true)?,
            LF => {
                if !self.token.is_empty() {
                    self.close_token(true)?;
                }
                return Ok(self.finish());
            }
            _ => self.token.push(byte),
        }
        Ok(None)
    }

    fn close_token(&mut self, at_line_end: bool) -> Result<(), HttpError> {
        let token = String::from_utf8_lossy(&self.token).into_owned();
        self.token.clear();

        match self.part {
            Part::Method => {
                if token.is_empty() && at_line_end {
                    return Ok(());
                }
                self.method = Some(Method::parse(&token)?);
                self.part = Part::Resource;
            }
            Part::Resource => {
                if token.is_empty() && at_line_end {
                    return Ok(());
                }
                self.resource = token;
                self.part = Part::Version;
            }
            Part::Version => {
                if !token.is_empty() {
                    self.version = token;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Option<StartLine> {
        let method = self.method.take()?;
        let line = StartLine {
            method,
            resource: std::mem::take(&mut self.resource),
            version: std::mem::take(&mut self.version),
        };
        self.part = Part::Method;
        Some(line)
    }
}

/// Read one request line off the connection.
///
/// `Ok(None)` means the peer closed the connection before starting a new
/// request.
pub async fn parse_start_line<R>(scanner: &mut Scanner<R>) -> Result<Option<StartLine>, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = StartLineParser::new();

    loop {
        let byte = match scanner.next_byte().await {
            Ok(Some(byte)) => byte,
            Ok(None) if !parser.in_progress() => return Ok(None),
            Ok(None) => {
                return Err(HttpError::InternalServerError(
                    "connection closed inside the request line".into(),
                ))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed reading the request line");
                return Err(e.into());
            }
        };

        if let Some(line) = parser.feed(byte)? {
            tracing::debug!(method = %line.method, resource = %line.resource, version = %line.version, "Parsed start line");
            return Ok(Some(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(input: &[u8]) -> Result<Option<StartLine>, HttpError> {
        let mut scanner = Scanner::new(input);
        parse_start_line(&mut scanner).await
    }

    #[tokio::test]
    async fn parses_well_formed_line() {
        let line = parse(b"GET /api/widgets HTTP/1.1\r\n").await.unwrap().unwrap();
        assert_eq!(line.method, Method::Get);
        assert_eq!(line.resource, "/api/widgets");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[tokio::test]
    async fn extra_tokens_land_in_version() {
        let line = parse(b"POST /x HTTP/1.1 trailing junk\r\n").await.unwrap().unwrap();
        assert_eq!(line.method, Method::Post);
        assert_eq!(line.resource, "/x");
        assert_eq!(line.version, "junk");
    }

    #[tokio::test]
    async fn lowercase_method_is_accepted() {
        let line = parse(b"delete /item/3 HTTP/1.0\r\n").await.unwrap().unwrap();
        assert_eq!(line.method, Method::Delete);
    }

    #[tokio::test]
    async fn unknown_method_is_405() {
        let err = parse(b"FOO /x HTTP/1.1\r\n").await.unwrap_err();
        assert_eq!(err.status(), 405);
    }

    #[tokio::test]
    async fn empty_resource_is_permitted() {
        let line = parse(b"GET  HTTP/1.1\r\n").await.unwrap().unwrap();
        assert_eq!(line.resource, "");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[tokio::test]
    async fn bare_lf_terminates_line() {
        let line = parse(b"GET /x HTTP/1.1\n").await.unwrap().unwrap();
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[tokio::test]
    async fn leading_blank_lines_are_skipped() {
        let line = parse(b"\r\n\r\nGET / HTTP/1.1\r\n").await.unwrap().unwrap();
        assert_eq!(line.resource, "/");
    }

    #[tokio::test]
    async fn eof_before_request_is_clean() {
        assert!(parse(b"").await.unwrap().is_none());
        assert!(parse(b"\r\n").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_mid_line_is_500() {
        let err = parse(b"GET /x HT").await.unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn feed_reports_line_only_on_lf() {
        let mut parser = StartLineParser::new();
        for byte in b"GET / HTTP/1.1\r" {
            assert!(parser.feed(*byte).unwrap().is_none());
        }
        let line = parser.feed(LF).unwrap().unwrap();
        assert_eq!(line.to_string(), "GET / HTTP/1.1");
        assert!(!parser.in_progress());
    }

    #[test]
    fn render_strips_prefix() {
        let line = StartLine {
            method: Method::Get,
            resource: "/api/widgets".into(),
            version: "HTTP/1.1".into(),
        };
        assert_eq!(line.render(Some("/api")), "GET /widgets HTTP/1.1");
        assert_eq!(line.render(None), "GET /api/widgets HTTP/1.1");
    }

    #[test]
    fn render_exact_context_becomes_root() {
        let line = StartLine {
            method: Method::Get,
            resource: "/api".into(),
            version: "HTTP/1.1".into(),
        };
        assert_eq!(line.render(Some("/api")), "GET / HTTP/1.1");

        let line = StartLine {
            resource: "/api?page=2".into(),
            ..line
        };
        assert_eq!(line.render(Some("/api")), "GET /?page=2 HTTP/1.1");
    }
}
