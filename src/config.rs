use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://disease.sh/v3/covid-19";

/// Runtime settings, read once at startup from `COVID_TRACKER_*` variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    /// Attempts per region fetch, including the first one.
    pub retries: u32,
    pub history_days: u32,
    pub data_dir: PathBuf,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            retries: 3,
            history_days: 120,
            data_dir: PathBuf::from("data"),
            log_path: PathBuf::from("covid-tracker.log"),
        }
    }
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let api_url = lookup("COVID_TRACKER_API_URL").unwrap_or(defaults.api_url);
        let parsed = reqwest::Url::parse(api_url.trim()).map_err(|e| ConfigError::InvalidUrl {
            key: "COVID_TRACKER_API_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                key: "COVID_TRACKER_API_URL",
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let timeout_secs = number(&lookup, "COVID_TRACKER_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        let retries = number(&lookup, "COVID_TRACKER_RETRIES", defaults.retries)?;
        let history_days = number(&lookup, "COVID_TRACKER_HISTORY_DAYS", defaults.history_days)?;

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            retries: retries.max(1),
            history_days: history_days.max(1),
            data_dir: lookup("COVID_TRACKER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_path: lookup("COVID_TRACKER_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
        })
    }
}
