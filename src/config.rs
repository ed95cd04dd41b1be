//! Client Settings
//!
//! Where the remote service lives and how the controller talks to it.
//! Loaded from a TOML file, then overridden from the environment.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

pub const ENV_BASE_URL: &str = "INTERVIEW_BASE_URL";
pub const ENV_CHANNEL_URL: &str = "INTERVIEW_CHANNEL_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "INTERVIEW_REQUEST_TIMEOUT_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "INTERVIEW_CONNECT_TIMEOUT_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_connect_timeout_ms() -> u64 {
    10000
}

fn default_event_capacity() -> usize {
    256
}

/// Settings for the HTTP service client, the realtime channel and the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Root of the interview service (`/offer`, `/cancel`)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Root of the realtime channel; derived from `base_url` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Used by both the HTTP client and the channel handshake
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Return to idle when the channel closes on its own while active
    #[serde(default)]
    pub idle_on_channel_close: bool,
    /// Per-subscriber buffer of presentation events
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            channel_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_on_channel_close: false,
            event_capacity: default_event_capacity(),
        }
    }
}

impl ClientSettings {
    /// Parse settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded client settings from {}", path.display());
        Self::from_toml(&text)
    }

    /// Override fields from `INTERVIEW_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            debug!("{} overrides base_url", ENV_BASE_URL);
            self.base_url = url;
        }
        if let Some(url) = lookup(ENV_CHANNEL_URL) {
            debug!("{} overrides channel_url", ENV_CHANNEL_URL);
            self.channel_url = Some(url);
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.request_timeout_ms = parse_millis(ENV_REQUEST_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            self.connect_timeout_ms = parse_millis(ENV_CONNECT_TIMEOUT_MS, &value)?;
        }
        Ok(())
    }

    /// Check URLs and timeouts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            field: "base_url",
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                field: "base_url",
                reason: format!("unsupported scheme {}", base.scheme()),
            });
        }
        self.resolved_channel_url()?;

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Realtime channel root: `channel_url`, or `base_url` with `http→ws`, `https→wss`
    pub fn resolved_channel_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.channel_url {
            let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                field: "channel_url",
                reason: e.to_string(),
            })?;
            return Ok(parsed.to_string());
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            field: "base_url",
            reason: e.to_string(),
        })?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(ConfigError::InvalidUrl {
                    field: "base_url",
                    reason: format!("cannot derive channel URL from scheme {}", other),
                })
            }
        };
        url.set_scheme(scheme).map_err(|_| ConfigError::InvalidUrl {
            field: "base_url",
            reason: format!("cannot switch scheme to {}", scheme),
        })?;
        Ok(url.to_string())
    }
}

fn parse_millis(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field,
        reason: format!("expected milliseconds, got {:?}", value),
    })
}
