//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (connection_id, peer_addr, context, port, resource)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stdout, filtered by level)
//! ```

pub mod logging;

pub use logging::init_logging;
