//! # Structured Logging
//!
//! tracing subscriber initialization for the worker binary. Filtering via
//! `RUST_LOG` with a worker-friendly default; `LOG_FORMAT=json` switches
//! the console output to JSON lines for log shippers.

use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,flopy_worker=debug";

/// Initialize the global tracing subscriber. Safe to call once; a second
/// call is ignored rather than panicking.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json_output = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json_output {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized");
    }
}
