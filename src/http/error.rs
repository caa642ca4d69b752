//! HTTP error taxonomy.
//!
//! Every parsing, routing, forwarding and file-serving failure is one of these
//! variants. The connection loop turns it into a status-line-only response and
//! closes the connection.

use thiserror::Error;

/// A failure that maps onto an HTTP status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("length required: {0}")]
    LengthRequired(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl HttpError {
    /// Status code sent on the wire.
    pub fn status(&self) -> u16 {
        match self {
            HttpError::MethodNotAllowed(_) => 405,
            HttpError::LengthRequired(_) => 411,
            HttpError::NotFound(_) => 404,
            HttpError::Forbidden(_) => 403,
            HttpError::InternalServerError(_) => 500,
        }
    }

    /// Reason phrase sent on the wire.
    pub fn reason(&self) -> &'static str {
        match self {
            HttpError::MethodNotAllowed(_) => "Method Not Allowed",
            HttpError::LengthRequired(_) => "Length Required",
            HttpError::NotFound(_) => "Not Found",
            HttpError::Forbidden(_) => "Forbidden",
            HttpError::InternalServerError(_) => "Internal Server Error",
        }
    }

    /// The underlying cause, without the status prefix.
    pub fn cause(&self) -> &str {
        match self {
            HttpError::MethodNotAllowed(c)
            | HttpError::LengthRequired(c)
            | HttpError::NotFound(c)
            | HttpError::Forbidden(c)
            | HttpError::InternalServerError(c) => c,
        }
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_reason_follow_variant() {
        let cases = [
            (HttpError::MethodNotAllowed("x".into()), 405, "Method Not Allowed"),
            (HttpError::LengthRequired("x".into()), 411, "Length Required"),
            (HttpError::NotFound("x".into()), 404, "Not Found"),
            (HttpError::Forbidden("x".into()), 403, "Forbidden"),
            (HttpError::InternalServerError("x".into()), 500, "Internal Server Error"),
        ];
        for (err, status, reason) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.reason(), reason);
        }
    }

    #[test]
    fn io_error_becomes_internal_server_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");
        let err: HttpError = io.into();
        assert_eq!(err.status(), 500);
        assert_eq!(err.cause(), "peer reset");
    }
}
