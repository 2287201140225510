//! # Provisioning Errors

use thiserror::Error;

use crate::resources::ManagedKind;
use crate::store::ConflictError;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Invalid Postgres resource: {0}")]
    InvalidResource(String),

    #[error("Failed to read {resource_type} strategy for tier {tier}")]
    ConfigUnavailable {
        resource_type: String,
        tier: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to decode {resource_type} strategy for tier {tier}")]
    ConfigMalformed {
        resource_type: String,
        tier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create or update {kind} {namespace}/{name}")]
    ObjectApplyFailed {
        kind: ManagedKind,
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to add finalizer to Postgres {namespace}/{name}")]
    FinalizerUpdateFailed {
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read status of {kind} {namespace}/{name}")]
    StatusUnavailable {
        kind: ManagedKind,
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Reconciliation cancelled during {operation}")]
    Cancelled { operation: &'static str },
}

impl ProvisionError {
    /// Whether invoking the provisioner again may succeed without a change to
    /// the resource or its strategy
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ProvisionError::InvalidResource(_) | ProvisionError::ConfigMalformed { .. }
        )
    }

    /// Whether the failure was an optimistic-concurrency conflict on the owner
    /// or a managed object; always retryable
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            ProvisionError::ObjectApplyFailed { source, .. }
            | ProvisionError::FinalizerUpdateFailed { source, .. }
            | ProvisionError::StatusUnavailable { source, .. } => {
                source.chain().any(|cause| cause.is::<ConflictError>())
            }
            _ => false,
        }
    }

    /// Short label used for metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ProvisionError::InvalidResource(_) => "invalid_resource",
            ProvisionError::ConfigUnavailable { .. } => "config_unavailable",
            ProvisionError::ConfigMalformed { .. } => "config_malformed",
            ProvisionError::ObjectApplyFailed { .. } => "object_apply_failed",
            ProvisionError::FinalizerUpdateFailed { .. } => "finalizer_update_failed",
            ProvisionError::StatusUnavailable { .. } => "status_unavailable",
            ProvisionError::Cancelled { .. } => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_config_is_permanent() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProvisionError::ConfigMalformed {
            resource_type: "postgres".to_string(),
            tier: "production".to_string(),
            source,
        };
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "config_malformed");
    }

    #[test]
    fn test_apply_failure_is_retryable_and_names_object() {
        let err = ProvisionError::ObjectApplyFailed {
            kind: ManagedKind::PodController,
            namespace: "ns1".to_string(),
            name: "db1".to_string(),
            source: anyhow::anyhow!("connection refused"),
        };
        assert!(err.is_retryable());
        assert!(!err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Failed to create or update Deployment ns1/db1"
        );
    }

    #[test]
    fn test_stale_owner_update_is_a_retryable_conflict() {
        let conflict = ConflictError {
            kind: "Postgres".to_string(),
            namespace: "ns1".to_string(),
            name: "db1".to_string(),
        };
        let err = ProvisionError::FinalizerUpdateFailed {
            namespace: "ns1".to_string(),
            name: "db1".to_string(),
            source: anyhow::Error::new(conflict).context("Failed to update Postgres ns1/db1"),
        };
        assert!(err.is_conflict());
        assert!(err.is_retryable());
        assert_eq!(err.reason(), "finalizer_update_failed");
    }

    #[test]
    fn test_cancelled_is_retryable() {
        let err = ProvisionError::Cancelled {
            operation: "strategy lookup",
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Reconciliation cancelled during strategy lookup"
        );
    }
}
