//! Runtime configuration.
//!
//! Defaults are usable as-is. Overrides come from JSON (`from_json`) or
//! `STOREFRONT_*` environment variables (`from_env`); both paths end in
//! [`SagaConfig::validate`].

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "STOREFRONT_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// How order creation gets its intent event onto the bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Commit, clear the cart, then publish. A failed publish strands the
    /// order in `PENDING` and is only reported as a warning.
    #[default]
    Direct,
    /// Write the event to the outbox inside the order commit; a relay
    /// publishes it.
    Outbox,
}

impl FromStr for PublishMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(PublishMode::Direct),
            "outbox" => Ok(PublishMode::Outbox),
            _ => Err(ConfigError::InvalidValue {
                key: "publish_mode".into(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxConfig {
    pub batch_size: usize,
    pub lease_secs: u64,
    pub max_attempts: u32,
    pub relay_interval_ms: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            lease_secs: 30,
            max_attempts: 5,
            relay_interval_ms: 20,
        }
    }
}

impl OutboxConfig {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    pub fn relay_interval(&self) -> Duration {
        Duration::from_millis(self.relay_interval_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SagaConfig {
    pub publish_mode: PublishMode,
    /// Poll timeout for the consumption lanes.
    pub poll_interval_ms: u64,
    /// Deliveries of one event before a retryable failure is dead-lettered.
    pub max_deliveries: u32,
    /// Copy dropped and exhausted events to `<topic>.dlq`.
    pub dead_letter: bool,
    pub log_filter: String,
    pub outbox: OutboxConfig,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            publish_mode: PublishMode::Direct,
            poll_interval_ms: 10,
            max_deliveries: 5,
            dead_letter: false,
            log_filter: "info".into(),
            outbox: OutboxConfig::default(),
        }
    }
}

impl SagaConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SagaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `STOREFRONT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = SagaConfig::default();

        if let Some(value) = var("PUBLISH_MODE") {
            config.publish_mode = value.parse()?;
        }
        if let Some(value) = var("POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse("POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = var("MAX_DELIVERIES") {
            config.max_deliveries = parse("MAX_DELIVERIES", &value)?;
        }
        if let Some(value) = var("DEAD_LETTER") {
            config.dead_letter = parse("DEAD_LETTER", &value)?;
        }
        if let Some(value) = var("LOG_FILTER") {
            config.log_filter = value;
        }
        if let Some(value) = var("OUTBOX_BATCH_SIZE") {
            config.outbox.batch_size = parse("OUTBOX_BATCH_SIZE", &value)?;
        }
        if let Some(value) = var("OUTBOX_LEASE_SECS") {
            config.outbox.lease_secs = parse("OUTBOX_LEASE_SECS", &value)?;
        }
        if let Some(value) = var("OUTBOX_MAX_ATTEMPTS") {
            config.outbox.max_attempts = parse("OUTBOX_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = var("OUTBOX_RELAY_INTERVAL_MS") {
            config.outbox.relay_interval_ms = parse("OUTBOX_RELAY_INTERVAL_MS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.max_deliveries == 0 {
            return Err(ConfigError::Zero("max_deliveries"));
        }
        if self.outbox.batch_size == 0 {
            return Err(ConfigError::Zero("outbox.batch_size"));
        }
        if self.outbox.lease_secs == 0 {
            return Err(ConfigError::Zero("outbox.lease_secs"));
        }
        if self.outbox.max_attempts == 0 {
            return Err(ConfigError::Zero("outbox.max_attempts"));
        }
        if self.outbox.relay_interval_ms == 0 {
            return Err(ConfigError::Zero("outbox.relay_interval_ms"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{name}"),
        value: value.to_string(),
    })
}
