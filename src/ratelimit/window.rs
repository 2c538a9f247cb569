//! Sliding-window rate limiter.
//!
//! A [`RateLimiter`] keeps a log of the instants at which callers were
//! admitted and allows at most `capacity` admissions inside any window of
//! length `window` ending "now". Callers either ask whether an admission
//! would currently be allowed ([`RateLimiter::can_fire`]) or block until it
//! is ([`RateLimiter::fire`]). Admission is delayed, never denied.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Longest single sleep taken while waiting for admission. The clock is
/// re-checked after every sleep.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest window a limiter will track; larger windows are clamped to it.
pub const MAX_WINDOW: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Outcome of a non-blocking admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The attempt was admitted and recorded.
    Granted,
    /// The attempt was not recorded; admission is possible from this instant.
    Delayed(Instant),
}

impl Admission {
    /// Whether the attempt was admitted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted)
    }
}

/// A single-owner sliding-window rate limiter.
///
/// Capacity and window are fixed for the lifetime of an instance; the
/// `with_*` methods return a new limiter with an empty history instead of
/// mutating this one.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum admissions inside one window
    capacity: u32,
    /// Window length; zero disables windowing
    window: Duration,
    /// Admission instants, oldest first
    hits: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter admitting `capacity` hits per `window`.
    ///
    /// A zero `window` means unrestricted; windows above [`MAX_WINDOW`] are
    /// clamped. A zero `capacity` is accepted and admits one hit per window:
    /// an empty history always admits, and each later hit has to wait for
    /// the previous one to age out.
    pub fn new(capacity: u32, window: Duration) -> Self {
        let window = if window > MAX_WINDOW {
            warn!(
                window_ms = millis(window),
                max_window_ms = millis(MAX_WINDOW),
                "Rate limiter window clamped to maximum"
            );
            MAX_WINDOW
        } else {
            window
        };

        if capacity == 0 && !window.is_zero() {
            warn!(
                window_ms = millis(window),
                "Rate limiter created with zero capacity; it will admit one hit per window"
            );
        }

        Self {
            capacity,
            window,
            hits: VecDeque::new(),
        }
    }

    /// Create an unrestricted limiter (capacity 1, no window).
    pub fn unrestricted() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// A new limiter with the same capacity and a window of `seconds`.
    pub fn with_window_seconds(&self, seconds: u64) -> Self {
        self.with_window(Duration::from_secs(seconds))
    }

    /// A new limiter with the same capacity and the given window.
    pub fn with_window(&self, window: Duration) -> Self {
        Self::new(self.capacity, window)
    }

    /// A new limiter with the same window admitting `hits` per window.
    pub fn with_capacity(&self, hits: u32) -> Self {
        Self::new(hits, self.window)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether windowing is disabled.
    pub fn is_unrestricted(&self) -> bool {
        self.window.is_zero()
    }

    /// Number of hits currently held in the log, including any that have
    /// expired but not yet been pruned.
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Would a hit be admitted right now without waiting?
    pub fn can_fire(&self) -> bool {
        self.can_fire_at(Instant::now())
    }

    /// Would a hit be admitted at `now` without waiting? Does not touch the log.
    pub fn can_fire_at(&self, now: Instant) -> bool {
        now >= self.next_allowed_at(now)
    }

    /// Earliest instant at which a hit is admitted, evaluated at `now`.
    ///
    /// Expired entries are skipped rather than removed, so repeated calls
    /// leave the limiter unchanged.
    pub fn next_allowed_at(&self, now: Instant) -> Instant {
        if self.window.is_zero() || self.hits.is_empty() {
            return now;
        }

        let expired = self.expired_prefix(now);
        self.resume_after(now, expired)
    }

    /// Record a hit if one is allowed at `now`, without blocking.
    ///
    /// Expired entries are pruned before the decision.
    pub fn try_fire_at(&mut self, now: Instant) -> Admission {
        let resume = self.prune_and_resume(now);
        if now >= resume {
            self.record(now);
            Admission::Granted
        } else {
            trace!(
                wait_ms = millis(resume - now),
                hits = self.hits.len(),
                "Hit delayed by rate limiter"
            );
            Admission::Delayed(resume)
        }
    }

    /// Record a hit if one is allowed right now, without blocking.
    pub fn try_fire(&mut self) -> Admission {
        self.try_fire_at(Instant::now())
    }

    /// Block the calling thread until a hit is allowed, then record it.
    pub fn fire(&mut self) {
        let resume = self.prune_and_resume(Instant::now());
        block_until(resume);
        self.record(Instant::now());
    }

    /// Suspend the calling task until a hit is allowed, then record it.
    pub async fn fire_async(&mut self) {
        let resume = self.prune_and_resume(Instant::now());
        pause_until(resume).await;
        self.record(Instant::now());
    }

    /// Drop expired entries and return the earliest admission instant.
    fn prune_and_resume(&mut self, now: Instant) -> Instant {
        if self.window.is_zero() || self.hits.is_empty() {
            return now;
        }

        let expired = self.expired_prefix(now);
        self.hits.drain(..expired);
        self.resume_after(now, 0)
    }

    /// Number of leading entries older than `now - window`.
    fn expired_prefix(&self, now: Instant) -> usize {
        match now.checked_sub(self.window) {
            Some(cutoff) => self.hits.partition_point(|hit| *hit < cutoff),
            // The cutoff predates anything the clock can have produced.
            None => 0,
        }
    }

    /// Admission instant given that the first `skip` entries are expired.
    fn resume_after(&self, now: Instant, skip: usize) -> Instant {
        let live = self.hits.len() - skip;
        if live < self.capacity as usize {
            return now;
        }

        // Zero capacity with every entry expired has no oldest hit to wait on.
        let oldest = match self.hits.get(skip) {
            Some(oldest) => *oldest,
            None => return now,
        };

        // Past the clock's range: keep the caller re-checking every poll.
        oldest
            .checked_add(self.window)
            .or_else(|| now.checked_add(POLL_INTERVAL))
            .unwrap_or(now)
    }

    fn record(&mut self, at: Instant) {
        // Keep the log ordered even if a caller hands in an older instant.
        let at = match self.hits.back() {
            Some(last) if *last > at => *last,
            _ => at,
        };
        self.hits.push_back(at);
        trace!(hits = self.hits.len(), capacity = self.capacity, "Hit recorded");
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unrestricted()
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Sleep the current thread until `deadline` has passed.
pub(crate) fn block_until(deadline: Instant) {
    let mut now = Instant::now();
    if now < deadline {
        debug!(wait_ms = millis(deadline - now), "Waiting for rate limit window");
    }
    while now < deadline {
        std::thread::sleep((deadline - now).min(POLL_INTERVAL));
        now = Instant::now();
    }
}

/// Suspend the current task until `deadline` has passed.
pub(crate) async fn pause_until(deadline: Instant) {
    let mut now = Instant::now();
    if now < deadline {
        debug!(wait_ms = millis(deadline - now), "Waiting for rate limit window");
    }
    while now < deadline {
        tokio::time::sleep((deadline - now).min(POLL_INTERVAL)).await;
        now = Instant::now();
    }
}
