//! # Observability
//!
//! Structured logging for synthesis runs.
//!
//! Logs are written to stderr so rendered templates on stdout stay clean.
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub fn default_filter(log_level: &str) -> String {
    format!("lambda_rds_stack={}", log_level.to_ascii_lowercase())
}

/// Install the global subscriber
///
/// Returns an error when a subscriber is already installed.
pub fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(log_level).into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}
