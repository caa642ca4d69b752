//! Configuration loading from disk.
//!
//! Precedence is command line > config file > defaults. The document root is
//! made absolute here so later path joins never depend on the working
//! directory changing.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ConfigOverrides, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the effective configuration.
///
/// When `required` is false a missing file falls back to the defaults.
pub fn resolve_config(
    path: &Path,
    required: bool,
    overrides: ConfigOverrides,
) -> Result<ServerConfig, ConfigError> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound && !required => {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            ServerConfig::default()
        }
        Err(e) => return Err(e),
    };

    overrides.apply(&mut config);

    if config.root.is_relative() {
        config.root = std::env::current_dir()?.join(&config.root);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
