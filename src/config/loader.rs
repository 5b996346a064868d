//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {path}")]
    NotFound { path: String },

    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let path_str = path.display().to_string();

    if !path.exists() {
        return Err(ConfigError::NotFound { path: path_str });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path_str.clone(),
        source,
    })?;

    load_config_from_str(&content, &path_str)
}

/// Load and validate configuration from a YAML string.
///
/// `source_name` only labels parse errors.
pub fn load_config_from_str(
    content: &str,
    source_name: &str,
) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: source_name.to_string(),
            source,
        })?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
