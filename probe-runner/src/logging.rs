//! Logging setup for the runner binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "probe_engine=info,probe_runner=info";

/// Initialize the global subscriber. Safe to call more than once.
pub fn init_logging(json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_names(true))
            .try_init()
    };

    match result {
        Ok(_) => tracing::debug!("Logging initialized"),
        Err(_) => tracing::debug!("Logging already initialized, skipping"),
    }
}
