//! Logging setup.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps logging configured for as long as it is alive.
pub struct TelemetryGuard {
	_private: (),
}

/// Build the level filter.
///
/// Priority:
/// 1. `log_level` argument (from the `--log-level` flag)
/// 2. `RUST_LOG` environment variable
/// 3. Default: info
pub fn filter(log_level: Option<Level>) -> EnvFilter {
	match log_level {
		Some(level) => EnvFilter::new(level.as_str()),
		None => EnvFilter::builder()
			.with_default_directive(Level::INFO.into())
			.from_env_lossy(),
	}
}

/// Initialize tracing on stderr: pretty when stderr is a terminal, JSON
/// lines otherwise.
pub fn init(log_level: Option<Level>) -> Result<TelemetryGuard> {
	let fmt_layer = if std::io::stderr().is_terminal() {
		tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.pretty()
			.boxed()
	} else {
		tracing_subscriber::fmt::layer()
			.with_writer(std::io::stderr)
			.json()
			.boxed()
	};

	tracing_subscriber::registry()
		.with(filter(log_level))
		.with(fmt_layer)
		.try_init()
		.context("failed to install tracing subscriber")?;

	Ok(TelemetryGuard { _private: () })
}
