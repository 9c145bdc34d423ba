//! Leaderboard configuration from environment variables

use crate::pipeline::backoff::RetryPolicy;
use crate::pipeline::fetcher::{FetchSettings, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::pipeline::ranker::DEFAULT_LIMIT;
use crate::pipeline::report::ReportSettings;
use crate::pipeline::types::Credential;
use crate::pipeline::window::WindowSize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.neynar.com/v2/farcaster/casts";
pub const DEFAULT_API_KEY_HEADER: &str = "api_key";
pub const DEFAULT_SOURCE_NAME: &str = "farcaster";

/// Configuration for the leaderboard binary
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    /// Casts collection endpoint
    pub api_url: String,

    /// Header carrying the API key
    pub api_key_header: String,

    /// API key (never logged)
    pub credential: Credential,

    /// Records requested per page
    pub page_size: usize,

    /// Leaderboard length
    pub result_limit: usize,

    /// Hard cap on pages per run
    pub max_pages: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries per page for transient failures
    pub max_retries: u32,
    pub retry_initial_ms: u64,
    pub retry_max_ms: u64,

    /// Name used in logs and export filenames
    pub source_name: String,

    /// Directory for CSV exports
    pub export_dir: PathBuf,

    pub default_window: WindowSize,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl LeaderboardConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `NEYNAR_API_KEY` (required)
    /// - `CASTRANK_API_URL` (default: https://api.neynar.com/v2/farcaster/casts)
    /// - `CASTRANK_API_KEY_HEADER` (default: api_key)
    /// - `CASTRANK_PAGE_SIZE` (default: 100)
    /// - `CASTRANK_RESULT_LIMIT` (default: 100)
    /// - `CASTRANK_MAX_PAGES` (default: 500)
    /// - `CASTRANK_REQUEST_TIMEOUT_SECS` (default: 10)
    /// - `CASTRANK_MAX_RETRIES` (default: 2)
    /// - `CASTRANK_RETRY_INITIAL_MS` (default: 500)
    /// - `CASTRANK_RETRY_MAX_MS` (default: 5000)
    /// - `CASTRANK_SOURCE_NAME` (default: farcaster)
    /// - `CASTRANK_EXPORT_DIR` (default: .)
    /// - `CASTRANK_DEFAULT_WINDOW` (default: 24h)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = lookup("NEYNAR_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|key| Credential::new(key.trim()))
            .ok_or_else(|| ConfigError::MissingVariable("NEYNAR_API_KEY".to_string()))?;

        let api_url = lookup("CASTRANK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "CASTRANK_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let default_window = match lookup("CASTRANK_DEFAULT_WINDOW") {
            Some(raw) => WindowSize::from_str(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!("CASTRANK_DEFAULT_WINDOW must be 24h or 7d, got '{}'", raw))
            })?,
            None => WindowSize::Day,
        };

        let config = Self {
            api_url,
            api_key_header: lookup("CASTRANK_API_KEY_HEADER")
                .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
            credential,
            page_size: parse_or(&lookup, "CASTRANK_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            result_limit: parse_or(&lookup, "CASTRANK_RESULT_LIMIT", DEFAULT_LIMIT),
            max_pages: parse_or(&lookup, "CASTRANK_MAX_PAGES", DEFAULT_MAX_PAGES),
            request_timeout_secs: parse_or(&lookup, "CASTRANK_REQUEST_TIMEOUT_SECS", 10),
            max_retries: parse_or(&lookup, "CASTRANK_MAX_RETRIES", 2),
            retry_initial_ms: parse_or(&lookup, "CASTRANK_RETRY_INITIAL_MS", 500),
            retry_max_ms: parse_or(&lookup, "CASTRANK_RETRY_MAX_MS", 5_000),
            source_name: lookup("CASTRANK_SOURCE_NAME")
                .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
            export_dir: lookup("CASTRANK_EXPORT_DIR")
                .unwrap_or_else(|| ".".to_string())
                .into(),
            default_window,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("CASTRANK_PAGE_SIZE", self.page_size),
            ("CASTRANK_RESULT_LIMIT", self.result_limit),
            ("CASTRANK_MAX_PAGES", self.max_pages),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} must be greater than 0", name)));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "CASTRANK_REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            fetch: FetchSettings {
                page_size: self.page_size,
                max_pages: self.max_pages,
                retry: RetryPolicy {
                    max_retries: self.max_retries,
                    initial_delay: Duration::from_millis(self.retry_initial_ms),
                    max_delay: Duration::from_millis(self.retry_max_ms),
                },
            },
            limit: self.result_limit,
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", key, raw, default);
            default
        }),
    }
}
