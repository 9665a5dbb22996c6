//! Tracing subscriber setup. Logs go to stderr so stdout stays clean.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Filter used when `SIGMA_LOG` is unset.
pub const DEFAULT_FILTER: &str = "sigma_demo=warn";

/// Installs the global subscriber; later calls are no-ops.
pub fn init(config: &Config) {
    let filter = config
        .log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let result = if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
    };
    if result.is_err() {
        tracing::trace!("subscriber already installed");
    }
}
