//! # Provisioner Configuration
//!
//! Provisioner-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_FIELD_MANAGER, DEFAULT_PROVISIONER_NAMESPACE, DEFAULT_STRATEGY_CONFIGMAP,
};

use super::defaults::PostgresDefaults;
use super::env::{env_var_or_default_bool, env_var_or_default_str};

/// Provisioner-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Namespace the provisioner runs in
    /// The strategy ConfigMap is read from this namespace
    pub namespace: String,
    /// Name of the ConfigMap holding per-tier strategies
    pub strategy_configmap_name: String,
    /// Field manager used for server-side apply of managed objects
    pub field_manager: String,
    /// Log level used when `RUST_LOG` is unset (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// Defaults for the generated postgres objects
    pub defaults: PostgresDefaults,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_PROVISIONER_NAMESPACE.to_string(),
            strategy_configmap_name: DEFAULT_STRATEGY_CONFIGMAP.to_string(),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
            enable_metrics: true,
            defaults: PostgresDefaults::default(),
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            namespace: env_var_or_default_str("POD_NAMESPACE", DEFAULT_PROVISIONER_NAMESPACE),
            strategy_configmap_name: env_var_or_default_str(
                "STRATEGY_CONFIGMAP_NAME",
                DEFAULT_STRATEGY_CONFIGMAP,
            ),
            field_manager: env_var_or_default_str("FIELD_MANAGER", DEFAULT_FIELD_MANAGER),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "json"),
            enable_metrics: env_var_or_default_bool("ENABLE_METRICS", true),
            defaults: PostgresDefaults::from_env(),
        }
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
