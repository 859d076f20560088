use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::error::ConfigError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// One shared list for the life of the process.
    Memory,
    /// Each client carries its own list in the `todos` cookie.
    Cookie,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageMode::Memory),
            "cookie" => Ok(StorageMode::Cookie),
            other => Err(format!("expected \"memory\" or \"cookie\", got \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageMode,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host: try_load("TODO_HOST", DEFAULT_HOST)?,
            port: try_load("TODO_PORT", &DEFAULT_PORT.to_string())?,
            storage: try_load("TODO_STORAGE", "memory")?,
            static_dir: try_load("TODO_STATIC_DIR", DEFAULT_STATIC_DIR)?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Same values [`Config::load`] falls back to when no `TODO_*` variable is set.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            storage: StorageMode::Memory,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match value.parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Invalid {key} value: {e}");
            Err(ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}
