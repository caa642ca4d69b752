//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store proxy contexts, virtual hosts and the document root
//! - Decide whether a resource is proxied or served locally
//! - Map a local resource onto a filesystem path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1)-ish lookup on the first path segment
//! - Proxy contexts win over virtual hosts, virtual hosts over the root

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::http::error::HttpError;
use crate::routing::matcher::split_first_segment;

/// File served for a directory-style resource.
pub const INDEX_FILE: &str = "index.html";

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Forward to one of `ports`; `context` is stripped before forwarding.
    Proxy { context: String, ports: Arc<[u16]> },
    /// Serve the file at this path.
    Local(PathBuf),
}

/// Compiled routing table.
#[derive(Debug)]
pub struct Router {
    root: PathBuf,
    virtual_hosts: BTreeMap<String, PathBuf>,
    proxy_contexts: BTreeMap<String, Arc<[u16]>>,
}

impl Router {
    pub fn new(
        root: PathBuf,
        virtual_hosts: BTreeMap<String, PathBuf>,
        proxy_contexts: BTreeMap<String, Vec<u16>>,
    ) -> Self {
        Self {
            root,
            virtual_hosts,
            proxy_contexts: proxy_contexts
                .into_iter()
                .map(|(context, ports)| (context, Arc::from(ports)))
                .collect(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.root.clone(),
            config.virtual_hosts.clone(),
            config.proxy_contexts.clone(),
        )
    }

    /// Resolve a request resource.
    pub fn resolve(&self, resource: &str) -> Result<Route, HttpError> {
        let (segment, _) = split_first_segment(resource);

        if let Some(ports) = self.proxy_contexts.get(&segment) {
            tracing::trace!(context = %segment, "Resource maps to a proxy context");
            return Ok(Route::Proxy {
                context: segment,
                ports: Arc::clone(ports),
            });
        }

        self.local_path(resource).map(Route::Local)
    }

    /// Filesystem path for a resource that is not proxied.
    pub fn local_path(&self, resource: &str) -> Result<PathBuf, HttpError> {
        let resource = if resource.is_empty() { "/" } else { resource };
        let (segment, rest) = split_first_segment(resource);

        let (base, relative) = match self.virtual_hosts.get(&segment) {
            Some(host_root) => {
                tracing::trace!(virtual_host = %segment, "Resource maps to a virtual host");
                let rest = if rest.is_empty() { "/" } else { rest };
                (host_root.as_path(), rest)
            }
            None => (self.root.as_path(), resource),
        };

        let path = join_resource(base, relative)?;
        tracing::trace!(path = %path.display(), "Resolved local resource");
        Ok(path)
    }
}

/// Append a URL path to `base`, refusing anything that climbs out of it.
fn join_resource(base: &Path, resource: &str) -> Result<PathBuf, HttpError> {
    let path = resource.split('?').next().unwrap_or_default();

    let mut joined = base.to_path_buf();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                return Err(HttpError::Forbidden(format!(
                    "'{}' escapes the document root",
                    resource
                )))
            }
            part => joined.push(part),
        }
    }

    if path.is_empty() || path.ends_with('/') {
        joined.push(INDEX_FILE);
    }
    Ok(joined)
}
