//! # Logging
//!
//! `tracing` subscriber setup. `RUST_LOG` wins over the configured level.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::ProvisionerConfig;

/// Directive used when `RUST_LOG` is unset
#[must_use]
pub fn default_directive(config: &ProvisionerConfig) -> String {
    format!("postgres_provisioner={}", config.log_level.to_lowercase())
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn init_logging(config: &ProvisionerConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(config).into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json_logs() {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
    }
}
