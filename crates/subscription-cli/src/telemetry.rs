// crates/subscription-cli/src/telemetry.rs
// ============================================================================
// Module: CLI Telemetry
// Description: Tracing subscriber installation.
// Purpose: Emit structured logs in the configured format and level.
// Dependencies: tracing-subscriber, subscription-config
// ============================================================================

//! ## Overview
//! Installs a global `tracing` subscriber once per process. `RUST_LOG`, when
//! set and valid, takes precedence over `log.level`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use subscription_config::LogConfig;
use subscription_config::LogFormat;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Subscriber
// ============================================================================

/// Telemetry installation failure.
#[derive(Debug, Error)]
#[error("failed to initialize logging: {0}")]
pub struct TelemetryError(String);

/// Installs the global subscriber for `config`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));
    let installed = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(true)).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };
    installed.map_err(|err| TelemetryError(err.to_string()))
}

/// Builds the level filter, preferring `RUST_LOG` when it parses.
fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
}
