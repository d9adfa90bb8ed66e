//! Environment configuration

use crate::runtime::{RuntimeConfig, CALL_TICK, DEFAULT_POLL_INTERVAL};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneConfig {
    /// Base URL of the telephony backend
    pub backend_url: String,
    /// Number the backend should present as ours
    pub caller_id: String,
    pub port: u16,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl PhoneConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let backend_url = required("PHONE_BACKEND_URL")?;
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "PHONE_BACKEND_URL",
                value: backend_url,
            });
        }

        let port = parse_or(&lookup, "PHONE_PORT", DEFAULT_PORT)?;
        let poll_secs = parse_or(&lookup, "PHONE_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs())?;
        let timeout_secs =
            parse_or(&lookup, "PHONE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT.as_secs())?;

        if poll_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "PHONE_POLL_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            backend_url,
            caller_id: required("PHONE_CALLER_ID")?,
            port,
            poll_interval: Duration::from_secs(poll_secs),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            poll_interval: self.poll_interval,
            tick_period: CALL_TICK,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
