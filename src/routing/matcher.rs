//! Route key extraction.
//!
//! # Responsibilities
//! - Pull the first path segment out of a request resource
//! - Split the resource into that key and the remainder
//!
//! # Design Decisions
//! - Proxy contexts and virtual hosts are keyed by the same segment, so both
//!   branches go through [`split_first_segment`]
//! - Matching is exact and case-sensitive
//! - A query string never belongs to the key

/// Split `/api/widgets?x=1` into (`/api`, `/widgets?x=1`).
///
/// An empty resource is treated as `/`.
pub fn split_first_segment(resource: &str) -> (String, &str) {
    let path = resource.strip_prefix('/').unwrap_or(resource);
    let end = path.find(['/', '?']).unwrap_or(path.len());
    let (segment, rest) = path.split_at(end);
    (format!("/{}", segment), rest)
}
