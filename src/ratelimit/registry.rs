//! Per-resource throttle registry.

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::shared::SharedRateLimiter;
use crate::config::ThrottleConfig;

/// Holds one shared limiter per throttled resource.
///
/// Limiters are created on first use from the configured settings for the
/// resource name and cached; every caller naming the same resource shares
/// one hit log.
pub struct ThrottleRegistry {
    /// Limiter settings by resource name
    config: RwLock<ThrottleConfig>,
    /// Limiters indexed by resource name
    limiters: DashMap<String, SharedRateLimiter>,
}

impl ThrottleRegistry {
    /// Create a registry where every resource is unrestricted.
    pub fn new() -> Self {
        Self::with_config(ThrottleConfig::new())
    }

    /// Create a registry with configuration.
    pub fn with_config(config: ThrottleConfig) -> Self {
        Self {
            config: RwLock::new(config),
            limiters: DashMap::new(),
        }
    }

    /// Replace the configuration. Existing limiters are dropped and will be
    /// recreated with the new settings on next use.
    pub fn set_config(&self, config: ThrottleConfig) {
        *self.config.write() = config;
        self.limiters.clear();
    }

    /// Get the current configuration.
    pub fn config(&self) -> ThrottleConfig {
        self.config.read().clone()
    }

    /// The limiter for `name`, creating it if needed.
    pub fn limiter(&self, name: &str) -> SharedRateLimiter {
        if let Some(limiter) = self.limiters.get(name) {
            return limiter.clone();
        }

        self.limiters
            .entry(name.to_string())
            .or_insert_with(|| {
                let settings = self.config.read().settings_for(name);
                debug!(
                    resource = %name,
                    capacity = settings.capacity,
                    window_ms = settings.window_ms,
                    "Creating rate limiter"
                );
                settings.build_shared()
            })
            .clone()
    }

    /// Would a call on `name` proceed right now without waiting?
    pub fn can_fire(&self, name: &str) -> bool {
        let allowed = self.limiter(name).can_fire();
        trace!(resource = %name, allowed, "Checked throttle");
        allowed
    }

    /// Wait until a call on `name` may proceed and record it.
    pub async fn fire(&self, name: &str) {
        self.limiter(name).fire_async().await
    }

    /// Block the calling thread until a call on `name` may proceed and record it.
    pub fn fire_blocking(&self, name: &str) {
        self.limiter(name).fire()
    }

    /// Number of limiters created so far.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    /// Drop all limiters and their history.
    pub fn clear(&self) {
        self.limiters.clear();
    }
}

impl Default for ThrottleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
