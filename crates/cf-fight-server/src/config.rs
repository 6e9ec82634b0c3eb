//! Server configuration, read from the environment at startup.
//!
//! A `.env` file in the working directory is honoured outside of tests.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

pub const DEFAULT_CF_API_BASE: &str = "https://codeforces.com/api";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// What a solo refresh does with solves recorded by earlier refreshes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SoloRefreshMode {
    /// Rebuild the table from the current submission feed.
    #[default]
    Recompute,
    /// Keep earlier records, like duel rooms do.
    Merge,
}

impl FromStr for SoloRefreshMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recompute" => Ok(SoloRefreshMode::Recompute),
            "merge" => Ok(SoloRefreshMode::Merge),
            other => Err(format!("'{}' is not one of recompute, merge", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub cf_api_base: String,
    /// Upper bound on every request to the judge.
    pub judge_timeout: Duration,
    pub log_level: Level,
    pub solo_refresh: SoloRefreshMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 4000)),
            cf_api_base: DEFAULT_CF_API_BASE.to_string(),
            judge_timeout: Duration::from_secs(10),
            log_level: Level::INFO,
            solo_refresh: SoloRefreshMode::Recompute,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".into(), e.to_string()))?,
            // PORT alone is what most hosts hand out.
            None => match lookup("PORT") {
                Some(port) => {
                    let port = port.parse::<u16>().map_err(|e| {
                        ConfigError::InvalidValue("PORT".into(), e.to_string())
                    })?;
                    SocketAddr::from(([0, 0, 0, 0], port))
                }
                None => defaults.bind_address,
            },
        };

        let cf_api_base = lookup("CF_API_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.cf_api_base);

        let judge_timeout = match lookup("JUDGE_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "JUDGE_TIMEOUT_SECS".into(),
                        format!("'{}' is not a positive number of seconds", raw),
                    ));
                }
            },
            None => defaults.judge_timeout,
        };

        let log_level = match lookup("RUST_LOG") {
            Some(raw) => raw.parse::<Level>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RUST_LOG".into(),
                    format!("'{}' is not a valid log level", raw),
                )
            })?,
            None => defaults.log_level,
        };

        let solo_refresh = match lookup("SOLO_REFRESH_MODE") {
            Some(raw) => raw
                .parse::<SoloRefreshMode>()
                .map_err(|e| ConfigError::InvalidValue("SOLO_REFRESH_MODE".into(), e))?,
            None => defaults.solo_refresh,
        };

        Ok(Config {
            bind_address,
            cf_api_base,
            judge_timeout,
            log_level,
            solo_refresh,
        })
    }
}
