//! Registry configuration
//!
//! ```toml
//! [storage]
//! backend = "file"
//! path = "./soreg-data"
//!
//! [sensor_data]
//! default_modifier = "lastUpdate"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use soreg_core::{DataModifier, DocumentStore, StoreError};
use soreg_store::{FileStore, MemoryStore};
use thiserror::Error;

/// Errors raised while loading configuration or opening the store
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
}

/// Top-level registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sensor_data: SensorDataConfig,
}

/// Backing store selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process memory, lost on exit
    #[default]
    Memory,
    /// JSON files in a directory
    File(FileStorageConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStorageConfig {
    /// Directory holding one JSON file per collection
    pub path: PathBuf,
}

/// Sensor data read defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorDataConfig {
    /// Modifier applied when the caller supplies none
    #[serde(default)]
    pub default_modifier: DataModifier,
}

impl RegistryConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the configured backing store
    pub async fn open_store(&self) -> Result<Arc<dyn DocumentStore>, ConfigError> {
        let store: Arc<dyn DocumentStore> = match &self.storage {
            StorageConfig::Memory => {
                tracing::info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
            StorageConfig::File(file) => {
                tracing::info!(path = %file.path.display(), "Using file store");
                Arc::new(FileStore::open(&file.path).await?)
            }
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_memory() {
        let config = RegistryConfig::from_toml("").unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.sensor_data.default_modifier, DataModifier::All);
    }

    #[test]
    fn test_file_backend() {
        let config = RegistryConfig::from_toml(
            r#"
[storage]
backend = "file"
path = "/var/lib/soreg"

[sensor_data]
default_modifier = "lastUpdate"
"#,
        )
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::File(FileStorageConfig {
                path: PathBuf::from("/var/lib/soreg")
            })
        );
        assert_eq!(
            config.sensor_data.default_modifier,
            DataModifier::LastUpdate
        );
    }

    #[test]
    fn test_file_backend_requires_path() {
        let err = RegistryConfig::from_toml("[storage]\nbackend = \"file\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = RegistryConfig::from_toml("[storage]\nbackend = \"mongo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RegistryConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig {
            storage: StorageConfig::File(FileStorageConfig {
                path: dir.path().join("data"),
            }),
            ..Default::default()
        };
        config.open_store().await.unwrap();
        assert!(dir.path().join("data").is_dir());
    }
}
