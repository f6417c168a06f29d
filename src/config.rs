//! Configuration loaded from `shadowq.toml`.
//!
//! ```toml
//! database_url = "postgres://localhost/app"
//! dialect = "postgres"
//! log_level = "debug"
//! max_connections = 5
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ShadowError, ShadowResult};
use crate::transpiler::Dialect;

pub const FILE_NAME: &str = "shadowq.toml";

/// Runtime configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database connection URL
    pub database_url: Option<String>,

    /// SQL dialect to emit
    pub dialect: Dialect,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Pool size for the sqlx driver
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            dialect: Dialect::default(),
            log_level: "warn".to_string(),
            max_connections: 5,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> ShadowResult<Self> {
        toml::from_str(content).map_err(|e| ShadowError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> ShadowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ShadowError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the first configuration found.
    ///
    /// An explicit path must exist. Otherwise `./shadowq.toml` and then
    /// `<config dir>/shadowq/config.toml` are tried, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> ShadowResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("shadowq").join("config.toml"));
        }
        paths
    }
}
