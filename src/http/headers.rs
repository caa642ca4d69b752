//! Header block parsing and the header container.
//!
//! Names are stored lowercase, both for request headers coming from clients and
//! for response headers coming from backends, so lookups such as
//! `content-length` or `cookie` behave the same on both paths.

use std::fmt;

use tokio::io::AsyncRead;

use crate::http::error::HttpError;
use crate::http::scanner::{Scanner, CR, LF};

pub const COOKIE: &str = "cookie";
pub const SET_COOKIE: &str = "set-cookie";
pub const CONTENT_LENGTH: &str = "content-length";

/// `Max-Age` used when issuing a cookie.
pub const COOKIE_MAX_AGE_SECS: u32 = 100;

/// Ordered header container.
///
/// `set-cookie` may occur several times; every other name holds one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First value stored under `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value stored under `name`, in arrival order.
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The value of `name` split on `delim`.
    pub fn values(&self, name: &str, delim: char) -> Option<Vec<&str>> {
        self.value(name).map(|v| v.split(delim).collect())
    }

    /// Set `name` to `value`, replacing whatever was there.
    ///
    /// The entry keeps the position of the first existing occurrence.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| *k == name) {
            Some(idx) => {
                self.entries[idx].1 = value;
                let mut seen = 0;
                self.entries.retain(|(k, _)| {
                    if *k == name {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Add another value for `name` without touching existing ones.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_ascii_lowercase(), value.into()));
    }

    /// Drop every entry for `name`, returning the first value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let mut removed = None;
        self.entries.retain(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                if removed.is_none() {
                    removed = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        removed
    }

    /// Value of the request cookie `name`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.values(COOKIE, ';')?.into_iter().find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
    }

    /// Issue `name=value` to the client.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.append(
            SET_COOKIE,
            format!("{}={}; Max-Age={}", name, value, COOKIE_MAX_AGE_SECS),
        );
    }

    /// Tell the client to drop `name`.
    pub fn expire_cookie(&mut self, name: &str) {
        self.append(SET_COOKIE, format!("{}=; Max-Age=0", name));
    }

    /// Strip `name` out of the request `Cookie` header.
    ///
    /// Other cookies keep their order. If nothing is left the header goes.
    pub fn delete_cookie(&mut self, name: &str) {
        let Some(pairs) = self.values(COOKIE, ';') else {
            return;
        };
        let kept: Vec<String> = pairs
            .into_iter()
            .filter(|pair| {
                let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
                key.trim() != name
            })
            .map(|pair| pair.trim().to_string())
            .filter(|pair| !pair.is_empty())
            .collect();

        if kept.is_empty() {
            self.remove(COOKIE);
        } else {
            self.insert(COOKIE, kept.join("; "));
        }
    }

    /// Wire form: one `Name: Value\r\n` per entry, no trailing blank line.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.entries.len() * 32);
        for (name, value) in &self.entries {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Incremental header-block parser.
///
/// CR bytes are ignored; an LF ends a line; an LF on an empty line ends the
/// block.
#[derive(Debug, Default)]
pub struct HeaderParser {
    line: Vec<u8>,
    headers: Headers,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one byte. Returns `true` once the blank line has been seen.
    pub fn feed(&mut self, byte: u8) -> bool {
        match byte {
            CR => false,
            LF if self.line.is_empty() => true,
            LF => {
                self.commit_line();
                false
            }
            _ => {
                self.line.push(byte);
                false
            }
        }
    }

    fn commit_line(&mut self) {
        let row = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();

        // no colon, or nothing before it: not a header
        let Some((name, value)) = row.split_once(':') else {
            return;
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return;
        }

        let value = value.trim();
        if name == SET_COOKIE {
            self.headers.append(&name, value);
        } else {
            self.headers.insert(&name, value);
        }
    }

    pub fn finish(mut self) -> Headers {
        if !self.line.is_empty() {
            self.commit_line();
        }
        self.headers
    }
}

/// Read a header block off the connection, up to and including its blank line.
///
/// A peer that closes early yields whatever was complete at that point.
pub async fn parse_headers<R>(scanner: &mut Scanner<R>) -> Result<Headers, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = HeaderParser::new();

    loop {
        match scanner.next_byte().await {
            Ok(Some(byte)) => {
                if parser.feed(byte) {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed reading the header section");
                return Err(e.into());
            }
        }
    }

    let headers = parser.finish();
    for (name, value) in headers.iter() {
        tracing::trace!(header = %name, value = %value, "Parsed header");
    }
    Ok(headers)
}
