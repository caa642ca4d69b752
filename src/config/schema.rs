//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the front door.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,

    /// Default document root for local files.
    pub root: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Host that proxy-context backends listen on.
    pub backend_host: String,

    /// Maximum concurrent client connections (backpressure).
    pub max_connections: usize,

    /// Path prefix → alternate document root.
    pub virtual_hosts: BTreeMap<String, PathBuf>,

    /// Path prefix → backend ports, in round-robin order.
    pub proxy_contexts: BTreeMap<String, Vec<u16>>,
}

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ROOT: &str = "root";
pub const DEFAULT_LOG_LEVEL: &str = "info";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            root: PathBuf::from(DEFAULT_ROOT),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_host: "127.0.0.1".to_string(),
            max_connections: 10_000,
            virtual_hosts: BTreeMap::new(),
            proxy_contexts: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Address the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Values given on the command line; each one beats the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}
