//! Static file serving.
//!
//! # Responsibilities
//! - Stat, open and read a resolved local path
//! - Guess the mime type from the file extension
//! - Map filesystem failures onto 404 / 403
//!
//! # Design Decisions
//! - Files are read whole; there is no range or streaming support
//! - A path that exists but cannot be read (directory, permissions) is 403

use std::io::ErrorKind;
use std::path::Path;

use crate::http::error::HttpError;

/// A file ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Load the file at `path`.
pub async fn load(path: &Path) -> Result<StaticFile, HttpError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Error stating file");
        if e.kind() == ErrorKind::PermissionDenied {
            HttpError::Forbidden(e.to_string())
        } else {
            HttpError::NotFound(e.to_string())
        }
    })?;

    if !metadata.is_file() {
        tracing::warn!(path = %path.display(), "Not a regular file");
        return Err(HttpError::Forbidden(format!("{} is not a file", path.display())));
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Error reading file");
        HttpError::Forbidden(e.to_string())
    })?;
    tracing::trace!(path = %path.display(), size = bytes.len(), "Read file");

    Ok(StaticFile {
        mime_type: mime_for(path),
        bytes,
    })
}

/// Mime type by extension, `application/octet-stream` when unknown.
pub fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_file_with_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<h1>hi</h1>").unwrap();

        let file = load(&path).await.unwrap();
        assert_eq!(file.mime_type, "text/html");
        assert_eq!(file.bytes, b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.txt")).await.unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn directory_is_403() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).await.unwrap_err();
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_for(Path::new("a.css")), "text/css");
        assert_eq!(mime_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_for(Path::new("a.unknownext")), "application/octet-stream");
    }
}
