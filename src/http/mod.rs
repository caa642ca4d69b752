//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → scanner.rs (buffered byte-at-a-time reads)
//!     → start_line.rs (METHOD RESOURCE VERSION)
//!     → headers.rs (header block up to the blank line)
//!     → [routing decides proxy vs. local file]
//!     → load_balancer forwarder, or body.rs + response.rs for files
//!     → server.rs loops until EOF or the first error
//! ```

pub mod body;
pub mod error;
pub mod headers;
pub mod method;
pub mod response;
pub mod scanner;
pub mod server;
pub mod start_line;

pub use error::HttpError;
pub use headers::Headers;
pub use method::Method;
pub use server::HttpServer;
pub use start_line::StartLine;
