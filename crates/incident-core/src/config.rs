use crate::encoding::INCIDENTS_PATH;
use crate::error::{IncidentError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default bound on every network call, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Set by the embedding application
    Explicit,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Explicit => 2,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the same precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the incident client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: ConfigValue<String>,
    pub request_timeout_secs: ConfigValue<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            base_url: ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(DEFAULT_TIMEOUT_SECS, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| IncidentError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| IncidentError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(base_url) = file_config.base_url {
            self.base_url.update(parse_base_url(&base_url)?, ConfigSource::File);
        }

        if let Some(secs) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(parse_timeout(secs)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Apply overrides supplied by the embedding application
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(base_url) = overrides.base_url {
            self.base_url.update(parse_base_url(&base_url)?, ConfigSource::Explicit);
        }

        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs.update(parse_timeout(secs)?, ConfigSource::Explicit);
        }

        Ok(())
    }

    /// Bound applied to every network call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    /// Endpoint for listing and creating incidents
    pub fn incidents_url(&self) -> String {
        format!("{}{}", self.base_url.value, INCIDENTS_PATH)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();
        map.insert("base_url".to_string(), (self.base_url.value.clone(), self.base_url.source));
        map.insert(
            "request_timeout_secs".to_string(),
            (self.request_timeout_secs.value.to_string(), self.request_timeout_secs.source),
        );
        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Explicit overrides from the embedding application
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Normalize a base URL: must be http(s) with a host, trailing slashes are dropped
pub fn parse_base_url(s: &str) -> Result<String> {
    let trimmed = s.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(IncidentError::ConfigInvalid {
            key: "base_url".to_string(),
            reason: format!("Invalid base URL: {}. Use an http:// or https:// URL", s),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_timeout(secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(IncidentError::ConfigInvalid {
            key: "request_timeout_secs".to_string(),
            reason: "Timeout must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}
