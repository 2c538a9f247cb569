//! Configuration management for throttles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, ThrottleError};
use crate::ratelimit::{RateLimiter, SharedRateLimiter};

/// Settings for a single sliding-window limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimiterSettings {
    /// Hits allowed per window
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Window length in milliseconds; 0 disables limiting
    #[serde(default)]
    pub window_ms: u64,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            window_ms: 0,
        }
    }
}

fn default_capacity() -> u32 {
    1
}

impl LimiterSettings {
    pub fn new(capacity: u32, window_ms: u64) -> Self {
        Self {
            capacity,
            window_ms,
        }
    }

    /// Window length as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Build a single-owner limiter from these settings.
    pub fn build(&self) -> RateLimiter {
        RateLimiter::new(self.capacity, self.window())
    }

    /// Build a shared limiter from these settings.
    pub fn build_shared(&self) -> SharedRateLimiter {
        SharedRateLimiter::new(self.capacity, self.window())
    }
}

/// Named limiter settings, one per throttled resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Settings for resources without an explicit entry
    #[serde(default)]
    pub default: LimiterSettings,

    /// Resource name to limiter settings
    #[serde(default)]
    pub limits: HashMap<String, LimiterSettings>,
}

impl ThrottleConfig {
    /// Create an empty configuration: every resource is unrestricted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the settings for a resource.
    pub fn with_limit(mut self, name: impl Into<String>, settings: LimiterSettings) -> Self {
        self.limits.insert(name.into(), settings);
        self
    }

    /// Settings that apply to `name`, falling back to the default.
    pub fn settings_for(&self, name: &str) -> LimiterSettings {
        self.limits.get(name).copied().unwrap_or(self.default)
    }

    /// Load configuration from a YAML or JSON file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading throttle configuration");

        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            Some("json") => Self::from_json(&contents),
            other => Err(ThrottleError::Config(format!(
                "Unsupported configuration format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ThrottleError::Config(format!("Failed to parse throttle config: {}", e)))
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ThrottleError::Config(format!("Failed to parse throttle config: {}", e)))
    }
}
