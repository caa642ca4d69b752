//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed resource (e.g. /api/widgets)
//!     → matcher.rs (first path segment: /api)
//!     → router.rs (proxy context? virtual host? document root?)
//!     → Return: Route::Proxy or Route::Local(path)
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - No regex in hot path (segment lookup only)
//! - Deterministic: same input always resolves to the same route
//! - Proxy and file branches share one segment-extraction rule

pub mod matcher;
pub mod router;

pub use router::{Route, Router};
