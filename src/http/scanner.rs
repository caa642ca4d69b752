//! Byte-at-a-time reader over a connection half.
//!
//! The start-line and header parsers are explicit state machines that pull one
//! byte at a time. The scanner sits on top of a `BufReader` so those pulls do
//! not each turn into a syscall, and body reads go through the same buffer so
//! nothing already buffered is lost between phases.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

pub const LF: u8 = b'\n';
pub const CR: u8 = b'\r';
pub const SP: u8 = b' ';

/// Buffered single-byte reader.
#[derive(Debug)]
pub struct Scanner<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> Scanner<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Next byte, or `None` once the peer has closed its side.
    pub async fn next_byte(&mut self) -> io::Result<Option<u8>> {
        match self.reader.read_u8().await {
            Ok(byte) => Ok(Some(byte)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read exactly `len` bytes.
    pub async fn read_exact(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// Read up to `buf.len()` bytes, buffered bytes first.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf).await
    }
}
