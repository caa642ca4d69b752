//! A small HTTP/1.1 front door.
//!
//! Requests whose first path segment names a proxy context are relayed to one
//! of that context's backends, chosen round-robin and then pinned to the
//! client by an affinity cookie. Everything else is served from the document
//! root, or from a virtual host's root when the first segment names one.

pub mod config;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
