//! # Readiness
//!
//! Decides from the Deployment's observed status whether the workload is
//! available, and builds connection details once it is.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use tracing::{debug, info, warn};

use crate::config::PostgresDefaults;
use crate::constants::{CONNECTION_URI_KEY, DEPLOYMENT_AVAILABLE_CONDITION};
use crate::provider::{ConnectionDetails, PostgresInstance, ProvisionOutcome};
use crate::resources::{ManagedKind, WorkloadIdentity};
use crate::store::ObjectStore;

use super::ProvisionError;

/// Whether the Deployment reports `Available=True`
#[must_use]
pub fn deployment_available(deployment: &Deployment) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == DEPLOYMENT_AVAILABLE_CONDITION && c.status == "True")
        })
}

/// `postgres://<user>:<password>@<name>.<namespace>.svc.cluster.local:<port>/<name>`
#[must_use]
pub fn connection_uri(workload: &WorkloadIdentity, defaults: &PostgresDefaults) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        defaults.user,
        defaults.password,
        workload.service_host(),
        defaults.port,
        workload.name
    )
}

#[must_use]
pub fn build_connection_details(
    workload: &WorkloadIdentity,
    defaults: &PostgresDefaults,
) -> ConnectionDetails {
    ConnectionDetails {
        connection: BTreeMap::from([(
            CONNECTION_URI_KEY.to_string(),
            connection_uri(workload, defaults).into_bytes(),
        )]),
    }
}

/// Read the Deployment back and decide readiness
///
/// A missing Deployment is pending rather than an error: the next pass
/// recreates it.
pub async fn evaluate_readiness<S: ObjectStore>(
    store: &S,
    workload: &WorkloadIdentity,
    defaults: &PostgresDefaults,
) -> Result<ProvisionOutcome, ProvisionError> {
    let deployment: Option<Deployment> = store
        .get(&workload.namespace, &workload.name)
        .await
        .map_err(|source| ProvisionError::StatusUnavailable {
            kind: ManagedKind::PodController,
            namespace: workload.namespace.clone(),
            name: workload.name.clone(),
            source,
        })?;

    let Some(deployment) = deployment else {
        warn!("Deployment {} disappeared before readiness check", workload);
        return Ok(ProvisionOutcome::Pending);
    };

    if deployment_available(&deployment) {
        info!("✅ Postgres deployment {} is available", workload);
        Ok(ProvisionOutcome::Ready(PostgresInstance {
            deployment_details: build_connection_details(workload, defaults),
        }))
    } else {
        debug!("Postgres deployment {} is not available yet", workload);
        Ok(ProvisionOutcome::Pending)
    }
}
