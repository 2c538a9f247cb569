//! Tracing subscriber setup for processes embedding throttles.

use tracing_subscriber::EnvFilter;

use crate::error::{Result, ThrottleError};

/// Level used when no filter directives are given.
const DEFAULT_DIRECTIVES: &str = "info";

/// Install a global `fmt` subscriber filtered by `directives`
/// (e.g. `"throttle=debug"`), optionally emitting JSON. Empty directives
/// fall back to `info`.
///
/// Fails if the directives do not parse or a global subscriber is
/// already installed.
pub fn init_tracing(directives: &str, json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(directives)?)
        .with_target(false)
        .with_thread_ids(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| ThrottleError::Telemetry(e.to_string()))
}

fn build_filter(directives: &str) -> Result<EnvFilter> {
    let directives = match directives.trim() {
        "" => DEFAULT_DIRECTIVES,
        trimmed => trimmed,
    };

    EnvFilter::try_new(directives)
        .map_err(|e| ThrottleError::Telemetry(format!("Invalid filter directives: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_empty_directives_fall_back_to_info() {
        let filter = build_filter("").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

        let filter = build_filter("   ").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_explicit_directives() {
        let filter = build_filter("debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_init_tracing_once() {
        init_tracing("", false).unwrap();
        assert!(init_tracing("debug", true).is_err());
    }
}
