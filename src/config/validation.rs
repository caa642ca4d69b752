//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Context and virtual-host keys are single path segments (`/name`)
//! - Every proxy context has at least one non-zero port
//! - A prefix is either proxied or remapped, never both
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Routing keys are matched against the first path segment only.
fn is_single_segment(key: &str) -> bool {
    key.len() > 1 && key.starts_with('/') && !key[1..].contains('/')
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_connections == 0 {
        errors.push(ValidationError::new("max_connections", "must be greater than 0"));
    }

    for (context, ports) in &config.proxy_contexts {
        let field = format!("proxy_contexts.{}", context);
        if !is_single_segment(context) {
            errors.push(ValidationError::new(&field, "must look like '/name'"));
        }
        if ports.is_empty() {
            errors.push(ValidationError::new(&field, "needs at least one backend port"));
        }
        if ports.contains(&0) {
            errors.push(ValidationError::new(&field, "port 0 is not a valid backend"));
        }
        if config.virtual_hosts.contains_key(context) {
            errors.push(ValidationError::new(&field, "also configured as a virtual host"));
        }
    }

    for host in config.virtual_hosts.keys() {
        if !is_single_segment(host) {
            errors.push(ValidationError::new(
                format!("virtual_hosts.{}", host),
                "must look like '/name'",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
