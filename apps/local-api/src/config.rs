use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything is optional — the local store needs no remote services.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the single key-value entry holding the serialized document.
    pub data_path: PathBuf,
    /// Trailing debounce window for editor persistence, in milliseconds.
    pub debounce_ms: u64,
    pub rust_log: String,
}

pub const DEFAULT_DATA_PATH: &str = "signimus-resume-data.json";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_path: std::env::var("LOCAL_API_DATA_PATH")
                .unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string())
                .into(),
            debounce_ms: std::env::var("LOCAL_API_DEBOUNCE_MS")
                .unwrap_or_else(|_| DEFAULT_DEBOUNCE_MS.to_string())
                .parse::<u64>()
                .context("LOCAL_API_DEBOUNCE_MS must be a number of milliseconds")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: DEFAULT_DATA_PATH.into(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            rust_log: "info".to_string(),
        }
    }
}
