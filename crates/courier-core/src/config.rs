//! Runtime configuration, overridable from the environment.
//!
//! | variable                      | default            |
//! |-------------------------------|--------------------|
//! | `COURIER_CHANNEL_CAPACITY`    | `64`               |
//! | `COURIER_FETCH_TIMEOUT_SECS`  | `30`               |
//! | `COURIER_USER_AGENT`          | `courier/<version>`|

use std::time::Duration;

pub const CHANNEL_CAPACITY_ENV: &str = "COURIER_CHANNEL_CAPACITY";
pub const FETCH_TIMEOUT_ENV: &str = "COURIER_FETCH_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "COURIER_USER_AGENT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourierConfig {
    /// Bound of each direction of the controller/worker channel.
    pub channel_capacity: usize,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            fetch_timeout: Duration::from_secs(30),
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CourierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(CHANNEL_CAPACITY_ENV) {
            let capacity = parse_positive(CHANNEL_CAPACITY_ENV, &raw)?;
            config.channel_capacity = capacity as usize;
        }

        if let Some(raw) = lookup(FETCH_TIMEOUT_ENV) {
            let secs = parse_positive(FETCH_TIMEOUT_ENV, &raw)?;
            config.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(USER_AGENT_ENV) {
            if raw.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: USER_AGENT_ENV,
                    value: raw,
                    reason: "must not be empty".to_string(),
                });
            }
            config.user_agent = raw;
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason,
    };
    let n: u64 = raw.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    if n == 0 {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(n)
}
