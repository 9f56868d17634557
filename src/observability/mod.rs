//! # Observability
//!
//! Structured logging via the tracing ecosystem. The filter comes from
//! `RUST_LOG` (default `info`); `CAMPANILE_LOG_FORMAT=json` switches to
//! JSON output for log shippers.

use tracing_subscriber::EnvFilter;

use crate::errors::Error;

pub fn init_logging() -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("CAMPANILE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if json { builder.json().try_init() } else { builder.try_init() };

    result.map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))
}
