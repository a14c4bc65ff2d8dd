//! Service configuration.
//!
//! Loaded once at startup from a YAML file; not hot-reloaded.

use crate::error::ServiceResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the fleetwatch service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    /// Seconds between sync passes.
    pub sync_interval_secs: u64,
}

/// Local store location.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Remote management API endpoint and credentials.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            remote: RemoteConfig::default(),
            sync_interval_secs: 300,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fleetwatch.db"),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:55000".to_string(),
            username: "fleetwatch".to_string(),
            password: String::new(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from a YAML file. Missing fields fall back
    /// to their defaults.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}
