//! Config file loading.
//!
//! The format is picked from the file extension.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported config format '{extension}' for {path} (expected yaml, yml, json or toml)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Read and decode a config file.
pub async fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = ConfigFormat::from_path(path)?;

    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded {:?} config from {}", format, path.display());

    parse_config(&content, format, path)
}

fn parse_config<T: DeserializeOwned>(content: &str, format: ConfigFormat, path: &Path) -> Result<T, ConfigError> {
    let path = path.to_path_buf();
    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml { path, source }),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|source| ConfigError::Json { path, source }),
        ConfigFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::Toml { path, source }),
    }
}
