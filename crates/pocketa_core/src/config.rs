//! Relay configuration.
//!
//! # Invariants
//! - `channel` is non-empty and contains no whitespace.
//! - Blank environment overrides fall back to the default channel.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Platform channel used when no override is configured.
pub const DEFAULT_CHANNEL: &str = "com.example.pocketaexpensetracker/voice";
/// Environment variable overriding the channel name.
pub const CHANNEL_ENV_VAR: &str = "POCKETA_RELAY_CHANNEL";

/// Host-provided relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Method channel name on the embedded side.
    pub channel: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl RelayConfig {
    /// Builds config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_channel_override(std::env::var(CHANNEL_ENV_VAR).ok())
    }

    fn from_channel_override(raw: Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = raw {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.channel = trimmed.to_string();
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.trim().is_empty() {
            return Err(ConfigError::EmptyChannel);
        }
        if self.channel.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidChannel(self.channel.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyChannel,
    InvalidChannel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyChannel => write!(f, "relay channel must not be empty"),
            Self::InvalidChannel(value) => {
                write!(f, "relay channel must not contain whitespace: `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}
