// src/telemetry.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "story_dashboard=info,warn";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Install the global tracing subscriber.
/// Filter comes from `RUST_LOG` (default `story_dashboard=info,warn`);
/// `LOG_FORMAT=json` switches from compact lines to JSON events.
/// Safe to call more than once: later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(json, "tracing initialised");
    }
}
