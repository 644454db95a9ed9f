//! Optional structured logging for hosts that embed mixdown.
//!
//! The library itself only emits `tracing` events; nothing is printed unless the host
//! installs a subscriber. Hosts without their own subscriber can call [`init`].

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable consulted for the log filter.
pub const LOG_ENV_VAR: &str = "MIXDOWN_LOG";

/// Initialize structured JSON logging at the default `error` level.
///
/// `MIXDOWN_LOG` overrides the filter, e.g. `MIXDOWN_LOG=mixdown=debug` shows the
/// per-call summaries emitted by every mixing operation.
pub fn init() {
    init_with_default(LevelFilter::ERROR);
}

/// Initialize structured JSON logging with a caller-chosen fallback level.
///
/// Safe to call repeatedly; only the first successful call installs a subscriber.
pub fn init_with_default(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init_with_default(LevelFilter::DEBUG);
        init();
    }
}
