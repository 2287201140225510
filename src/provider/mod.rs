//! # Providers
//!
//! A provider turns a `Postgres` resource into a running instance for one
//! deployment strategy. The in-cluster provisioner answers to the `openshift`
//! strategy; other strategies (managed cloud databases) live elsewhere.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::crd::Postgres;
use crate::provisioner::ProvisionError;

/// Connection material for a provisioned instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionDetails {
    pub connection: BTreeMap<String, Vec<u8>>,
}

impl ConnectionDetails {
    /// Key/value pairs suitable for a Secret's `data`
    #[must_use]
    pub fn data(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.connection
    }
}

/// A postgres instance that is ready to accept connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresInstance {
    pub deployment_details: ConnectionDetails,
}

/// Result of a provisioning pass that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Ready(PostgresInstance),
    /// Objects are in place but the workload is not available yet; call again
    Pending,
}

impl ProvisionOutcome {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, ProvisionOutcome::Ready(_))
    }

    #[must_use]
    pub fn instance(&self) -> Option<&PostgresInstance> {
        match self {
            ProvisionOutcome::Ready(instance) => Some(instance),
            ProvisionOutcome::Pending => None,
        }
    }

    /// Short label used for metrics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionOutcome::Ready(_) => "ready",
            ProvisionOutcome::Pending => "pending",
        }
    }
}

/// Provider trait for postgres deployment strategies
#[async_trait]
pub trait PostgresProvider: Send + Sync {
    /// Name used in logs and status
    fn name(&self) -> &'static str;

    /// Whether this provider handles the given deployment strategy
    fn supports_strategy(&self, deployment_strategy: &str) -> bool;

    /// Drive the resource towards a running instance
    ///
    /// Idempotent: call again on `Pending` or on a retryable error.
    async fn create_postgres(
        &self,
        postgres: &Postgres,
        cancel: &CancellationToken,
    ) -> Result<ProvisionOutcome, ProvisionError>;

    /// Tear down the instance
    async fn delete_postgres(&self, postgres: &Postgres) -> Result<(), ProvisionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        let ready = ProvisionOutcome::Ready(PostgresInstance {
            deployment_details: ConnectionDetails::default(),
        });
        assert!(ready.is_ready());
        assert_eq!(ready.as_str(), "ready");
        assert!(ready.instance().is_some());

        assert!(!ProvisionOutcome::Pending.is_ready());
        assert_eq!(ProvisionOutcome::Pending.as_str(), "pending");
        assert!(ProvisionOutcome::Pending.instance().is_none());
    }
}
