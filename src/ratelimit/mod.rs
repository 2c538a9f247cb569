//! Rate limiting logic and state management.

mod backend;
mod registry;
mod shared;
mod window;

pub use backend::Throttle;
pub use registry::ThrottleRegistry;
pub use shared::SharedRateLimiter;
pub use window::{Admission, RateLimiter, MAX_WINDOW, POLL_INTERVAL};
