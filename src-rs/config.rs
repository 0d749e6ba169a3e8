use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const STORE_URI_VAR: &str = "TASKBOARD_STORE_URI";
pub const PORT_VAR: &str = "PORT";
pub const STATIC_DIR_VAR: &str = "TASKBOARD_STATIC_DIR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TASKBOARD_STORE_URI is not set")]
    MissingStoreUri,

    #[error("unsupported store uri `{0}`, expected memory:// or file://<path>")]
    UnsupportedStoreUri(String),
}

/// Where tasks are kept, parsed from the store connection string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl FromStr for StoreLocation {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed == "memory://" || trimmed == "memory:" {
            return Ok(StoreLocation::Memory);
        }
        match trimmed.strip_prefix("file://") {
            Some(path) if !path.is_empty() => Ok(StoreLocation::File(PathBuf::from(path))),
            _ => Err(ConfigError::UnsupportedStoreUri(raw.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub store: StoreLocation,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(store: StoreLocation) -> Self {
        Self {
            port: DEFAULT_PORT,
            store,
            static_dir: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = lookup(STORE_URI_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .ok_or(ConfigError::MissingStoreUri)?
            .parse::<StoreLocation>()?;

        let mut config = Self::new(store);
        if let Some(raw) = lookup(PORT_VAR) {
            match raw.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(err) => {
                    warn!("Invalid {PORT_VAR} value `{raw}`: {err}, using default {DEFAULT_PORT}");
                }
            }
        }
        config.static_dir = lookup(STATIC_DIR_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}
