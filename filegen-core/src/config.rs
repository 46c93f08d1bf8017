//! Runtime configuration
//!
//! Defaults match the demo's UX timings. Every value may be overridden
//! from the environment.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GENERATION_LATENCY_MS: u64 = 2000;
pub const DEFAULT_EXPORT_LATENCY_MS: u64 = 500;

pub fn default_log_filter() -> &'static str {
    "filegen_core=info,filegen_cli=info"
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Simulated latency of a full generation job
    pub generation_latency: Duration,
    /// Simulated latency of the export-preparation step
    pub export_latency: Duration,
    /// Where DirectoryHost saves downloads
    pub download_dir: PathBuf,
    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation_latency: Duration::from_millis(DEFAULT_GENERATION_LATENCY_MS),
            export_latency: Duration::from_millis(DEFAULT_EXPORT_LATENCY_MS),
            download_dir: PathBuf::from("downloads"),
            log_filter: default_log_filter().to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        Ok(Self {
            generation_latency: millis(&lookup, "FILEGEN_GENERATION_LATENCY_MS")?
                .unwrap_or(default.generation_latency),
            export_latency: millis(&lookup, "FILEGEN_EXPORT_LATENCY_MS")?
                .unwrap_or(default.export_latency),
            download_dir: lookup("FILEGEN_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.download_dir),
            log_filter: lookup("FILEGEN_LOG").unwrap_or(default.log_filter),
        })
    }
}

fn millis<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
