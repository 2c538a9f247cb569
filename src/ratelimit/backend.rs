//! Throttle trait for abstracting over admission-control implementations.

use async_trait::async_trait;

use super::shared::SharedRateLimiter;

/// Trait for throttles an outgoing call path can wait on.
///
/// Dispatch layers hold a `dyn Throttle` so they can be handed a real
/// limiter or an unrestricted one without knowing which.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Would a call proceed right now without waiting?
    fn can_fire(&self) -> bool;

    /// Wait until a call may proceed and record it.
    async fn fire(&self);
}

#[async_trait]
impl Throttle for SharedRateLimiter {
    fn can_fire(&self) -> bool {
        SharedRateLimiter::can_fire(self)
    }

    async fn fire(&self) {
        self.fire_async().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_throttle_object() {
        let throttle: Arc<dyn Throttle> =
            Arc::new(SharedRateLimiter::new(1, Duration::from_secs(5)));

        assert!(throttle.can_fire());
        throttle.fire().await;
        assert!(!throttle.can_fire());
    }
}
