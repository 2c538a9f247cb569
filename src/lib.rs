//! Throttle - Sliding-Window Admission Control
//!
//! This crate implements a sliding-window rate limiter for throttling
//! outgoing calls such as RPC requests. A limiter admits at most a fixed
//! number of hits inside any window of fixed length, and callers either ask
//! whether a hit would be admitted now or wait until it is.

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod telemetry;

pub use config::{LimiterSettings, ThrottleConfig};
pub use error::{Result, ThrottleError};
pub use ratelimit::{Admission, RateLimiter, SharedRateLimiter, Throttle, ThrottleRegistry};
