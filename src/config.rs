use std::path::PathBuf;

use thiserror::Error;

use crate::playback::{DEFAULT_INTERVAL_MS, MAX_INTERVAL_MS, MIN_INTERVAL_MS};

pub const CATALOG_VAR: &str = "CALLFLOW_CATALOG";
pub const DELAY_VAR: &str = "CALLFLOW_DELAY_MS";
pub const LOG_VAR: &str = "CALLFLOW_LOG";
pub const FLOW_VAR: &str = "CALLFLOW_FLOW";

const DEFAULT_CATALOG: &str = "flows/catalog.toml";
const DEFAULT_LOG: &str = "callflow.log";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CALLFLOW_DELAY_MS must be a whole number of milliseconds, got '{0}'")]
    InvalidDelay(String),
    #[error("CALLFLOW_DELAY_MS must be at least 100 ms, got {0}")]
    DelayTooSmall(u64),
    #[error("CALLFLOW_DELAY_MS must be at most 9999999 ms, got {0}")]
    DelayTooLarge(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub interval_ms: u64,
    pub log_path: PathBuf,
    /// Flow shown at startup; the first catalog entry when unset.
    pub initial_flow: Option<String>,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let interval_ms = match lookup(DELAY_VAR) {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidDelay(raw.clone()))?;
                if ms < MIN_INTERVAL_MS {
                    return Err(ConfigError::DelayTooSmall(ms));
                }
                if ms > MAX_INTERVAL_MS {
                    return Err(ConfigError::DelayTooLarge(ms));
                }
                ms
            }
            None => DEFAULT_INTERVAL_MS,
        };

        Ok(Self {
            catalog_path: lookup(CATALOG_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG)),
            interval_ms,
            log_path: lookup(LOG_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG)),
            initial_flow: lookup(FLOW_VAR).filter(|name| !name.trim().is_empty()),
        })
    }
}
