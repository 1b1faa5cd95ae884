//! Tracing setup for the service and the batch tools.
//!
//! Everything goes to stderr; stdout belongs to the batch reports. The
//! level comes from `[logging]` config, `--verbose` forces debug, and
//! `RUST_LOG` overrides both. JSON output is for log shippers, selected by
//! config or `--json-logs`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use webpress_core::config::LoggingConfig;

pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}
