use crate::config::AppConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Development gets human-readable output at `debug`; every other
/// environment gets JSON at `info`. `RUST_LOG` overrides either level.
pub fn init(config: &AppConfig) {
    let development = config.environment.is_development();
    let default_level = if development { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = if development {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init()
    };

    // A subscriber installed earlier (tests, embedding) wins.
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
