//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route::Proxy { context, ports }
//!     → cookie.rs (read / mint the affinity token)
//!     → affinity.rs (sticky port, or next round-robin port + bind)
//!     → forwarder.rs (dial, relay request, rewrite Set-Cookie, relay response)
//! ```
//!
//! # Design Decisions
//! - Affinity state is one lock-guarded object shared by `Arc`
//! - Backend connections are per request; no pooling
//! - No fallback to another backend when the chosen one fails

pub mod affinity;
pub mod cookie;
pub mod forwarder;

pub use affinity::{Affinity, AffinityState, Assignment};
pub use cookie::AFFINITY_COOKIE;
pub use forwarder::Forwarder;
