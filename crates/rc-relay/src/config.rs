//! RC relay configuration.
//!
//! Configuration is loaded from environment variables. Numeric values that
//! fail to parse are rejected rather than silently replaced by defaults.

use crate::actors::RegistryConfig;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default health/metrics endpoint bind address.
pub const DEFAULT_HEALTH_BIND_ADDRESS: &str = "0.0.0.0:8090";

/// Default number of delta frames forwarded between keyframes before
/// further deltas are dropped.
pub const DEFAULT_FRAME_BACKLOG_CAPACITY: usize = 100;

/// Default per-connection outbound buffer size suggested to transports.
pub const DEFAULT_OBSERVER_BUFFER: usize = 256;

/// Default time allowed for graceful shutdown.
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 10;

/// Default relay instance ID prefix.
pub const DEFAULT_RELAY_ID_PREFIX: &str = "rc-relay";

/// RC relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this relay instance.
    pub relay_id: String,

    /// Health endpoint bind address (default: "0.0.0.0:8090").
    pub health_bind_address: String,

    /// Delta frames forwarded since the last keyframe before drops start.
    pub frame_backlog_capacity: usize,

    /// Outbound buffer size for each connection handle.
    pub observer_buffer: usize,

    /// Grace period for shutting down the registry.
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let health_bind_address = vars
            .get("RC_RELAY_HEALTH_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HEALTH_BIND_ADDRESS.to_string());

        let frame_backlog_capacity = parse_positive(
            vars,
            "RC_RELAY_FRAME_BACKLOG_CAPACITY",
            DEFAULT_FRAME_BACKLOG_CAPACITY,
        )?;

        let observer_buffer =
            parse_positive(vars, "RC_RELAY_OBSERVER_BUFFER", DEFAULT_OBSERVER_BUFFER)?;

        let shutdown_grace_seconds = match vars.get("RC_RELAY_SHUTDOWN_GRACE_SECONDS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue(format!("RC_RELAY_SHUTDOWN_GRACE_SECONDS: {e}"))
            })?,
            None => DEFAULT_SHUTDOWN_GRACE_SECONDS,
        };

        let relay_id = vars.get("RC_RELAY_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_RELAY_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            relay_id,
            health_bind_address,
            frame_backlog_capacity,
            observer_buffer,
            shutdown_grace_seconds,
        })
    }

    /// Shutdown grace period as a `Duration`.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }

    /// Registry settings derived from this configuration.
    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            registry_id: self.relay_id.clone(),
            frame_backlog_capacity: self.frame_backlog_capacity,
            observer_buffer: self.observer_buffer,
        }
    }
}

/// Parse an optional variable that must be a positive integer.
fn parse_positive(
    vars: &HashMap<String, String>,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value = raw
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidValue(format!("{name}: {e}")))?;

    if value == 0 {
        return Err(ConfigError::InvalidValue(format!(
            "{name} must be at least 1"
        )));
    }

    Ok(value)
}
