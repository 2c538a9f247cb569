//! Thread-safe wrapper around [`RateLimiter`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::window::{block_until, pause_until, Admission, RateLimiter};

/// A rate limiter that can be shared across threads and tasks.
///
/// Clones share the same hit log. The admission check and the recording of
/// the hit happen under a single lock acquisition, so concurrent callers can
/// never be admitted past capacity. Waiting happens outside the lock.
#[derive(Debug, Clone)]
pub struct SharedRateLimiter {
    inner: Arc<Mutex<RateLimiter>>,
}

impl SharedRateLimiter {
    /// Create a shared limiter admitting `capacity` hits per `window`.
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self::from_limiter(RateLimiter::new(capacity, window))
    }

    /// Wrap an existing limiter, keeping its history.
    pub fn from_limiter(limiter: RateLimiter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(limiter)),
        }
    }

    /// Create an unrestricted shared limiter.
    pub fn unrestricted() -> Self {
        Self::from_limiter(RateLimiter::unrestricted())
    }

    /// A new, independent limiter with the same capacity and a window of `seconds`.
    pub fn with_window_seconds(&self, seconds: u64) -> Self {
        Self::from_limiter(self.inner.lock().with_window_seconds(seconds))
    }

    /// A new, independent limiter with the same window admitting `hits` per window.
    pub fn with_capacity(&self, hits: u32) -> Self {
        Self::from_limiter(self.inner.lock().with_capacity(hits))
    }

    pub fn capacity(&self) -> u32 {
        self.inner.lock().capacity()
    }

    pub fn window(&self) -> Duration {
        self.inner.lock().window()
    }

    pub fn hit_count(&self) -> usize {
        self.inner.lock().hit_count()
    }

    /// Would a hit be admitted right now without waiting?
    pub fn can_fire(&self) -> bool {
        self.inner.lock().can_fire_at(Instant::now())
    }

    /// Record a hit if one is allowed right now, without blocking.
    pub fn try_fire(&self) -> Admission {
        self.inner.lock().try_fire_at(Instant::now())
    }

    /// Block the calling thread until a hit is admitted and recorded.
    pub fn fire(&self) {
        while let Admission::Delayed(resume) = self.try_fire() {
            block_until(resume);
        }
    }

    /// Suspend the calling task until a hit is admitted and recorded.
    pub async fn fire_async(&self) {
        loop {
            let admission = self.try_fire();
            match admission {
                Admission::Granted => return,
                Admission::Delayed(resume) => pause_until(resume).await,
            }
        }
    }
}

impl Default for SharedRateLimiter {
    fn default() -> Self {
        Self::unrestricted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_history() {
        let limiter = SharedRateLimiter::new(2, Duration::from_secs(10));
        let other = limiter.clone();

        limiter.fire();
        other.fire();

        assert_eq!(limiter.hit_count(), 2);
        assert!(!limiter.can_fire());
        assert!(!other.can_fire());
    }

    #[test]
    fn test_try_fire_does_not_block() {
        let limiter = SharedRateLimiter::new(1, Duration::from_secs(10));

        assert!(limiter.try_fire().is_granted());
        assert!(matches!(limiter.try_fire(), Admission::Delayed(_)));
        assert_eq!(limiter.hit_count(), 1);
    }

    #[test]
    fn test_reconfiguration_is_independent() {
        let limiter = SharedRateLimiter::new(1, Duration::from_secs(10));
        limiter.fire();

        let relaxed = limiter.with_capacity(3);
        assert_eq!(relaxed.hit_count(), 0);
        assert!(relaxed.can_fire());
        assert!(!limiter.can_fire());

        let shorter = limiter.with_window_seconds(0);
        assert!(shorter.can_fire());
        assert_eq!(shorter.capacity(), 1);
        assert_eq!(limiter.window(), Duration::from_secs(10));
    }

    #[test]
    fn test_concurrent_fires_respect_capacity() {
        let limiter = SharedRateLimiter::new(3, Duration::from_millis(200));
        let started = Instant::now();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || limiter.fire())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Only three fit in the first window; the rest waited for it to roll.
        assert!(started.elapsed() >= Duration::from_millis(200));
        // Hits from the first window may already have been pruned.
        assert!((3..=6).contains(&limiter.hit_count()));
    }

    #[tokio::test]
    async fn test_fire_async_across_tasks() {
        let limiter = SharedRateLimiter::new(2, Duration::from_millis(150));
        let started = Instant::now();

        let tasks = (0..4).map(|_| {
            let limiter = limiter.clone();
            async move { limiter.fire_async().await }
        });
        futures::future::join_all(tasks).await;

        assert!(started.elapsed() >= Duration::from_millis(150));
        assert!((2..=4).contains(&limiter.hit_count()));
    }

    #[test]
    fn test_fire_async_from_sync_context() {
        let limiter = SharedRateLimiter::unrestricted();

        for _ in 0..3 {
            tokio_test::block_on(limiter.fire_async());
        }
        assert!(limiter.can_fire());
    }
}
