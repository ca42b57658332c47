use crate::db::{Database, SqliteDocuments};
use crate::diagnostics::EnvPresence;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Server settings as read from a TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            database_name: None,
        }
    }
}

impl ServerConfig {
    /// Layers `overrides` (environment or command line) on top of `file`, on
    /// top of the defaults. Empty strings count as unset.
    pub fn resolve(file: FileConfig, overrides: FileConfig) -> Self {
        let defaults = Self::default();
        Self {
            host: non_empty(overrides.host)
                .or(non_empty(file.host))
                .unwrap_or(defaults.host),
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            database_url: non_empty(overrides.database_url).or(non_empty(file.database_url)),
            database_name: non_empty(overrides.database_name).or(non_empty(file.database_name)),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn env_presence(&self) -> EnvPresence {
        EnvPresence {
            database_url: self.database_url.is_some(),
            database_name: self.database_name.is_some(),
        }
    }

    /// The process-wide store. Uninitialised when no database URL is set.
    pub fn store(&self) -> SqliteDocuments {
        let database = self
            .database_url
            .as_deref()
            .map(|url| Database::new(url, self.database_name.as_deref()));
        SqliteDocuments::new(database)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
