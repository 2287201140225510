//! # Postgres Strategy
//!
//! Typed overrides decoded from a postgres strategy document.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{PersistentVolumeClaimSpec, ServiceSpec};
use k8s_openapi::ByteString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::POSTGRES_RESOURCE_TYPE;
use crate::provisioner::ProvisionError;

use super::{StrategyConfig, StrategyStore};

/// Overrides a strategy may supply for each managed object
///
/// Every field is optional. A present field replaces the corresponding
/// default spec entirely; an absent one leaves the default in place.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PostgresStrategy {
    #[serde(
        default,
        rename = "PostgresDeploymentSpec",
        alias = "deploymentSpec",
        skip_serializing_if = "Option::is_none"
    )]
    pub deployment_spec: Option<DeploymentSpec>,
    #[serde(
        default,
        rename = "PostgresServiceSpec",
        alias = "serviceSpec",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_spec: Option<ServiceSpec>,
    #[serde(
        default,
        rename = "PostgresPVCSpec",
        alias = "pvcSpec",
        skip_serializing_if = "Option::is_none"
    )]
    pub pvc_spec: Option<PersistentVolumeClaimSpec>,
    /// Secret data; values are base64 encoded in the document
    #[serde(
        default,
        rename = "PostgresSecretData",
        alias = "secretData",
        skip_serializing_if = "Option::is_none"
    )]
    pub secret_data: Option<BTreeMap<String, ByteString>>,
}

impl PostgresStrategy {
    /// Decode a raw strategy document
    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

/// Read and decode the postgres strategy for a tier
///
/// Store failures surface as `ConfigUnavailable`, decode failures as
/// `ConfigMalformed`. Nothing is retried here.
pub async fn load_postgres_strategy<C: StrategyStore + ?Sized>(
    store: &C,
    tier: &str,
) -> Result<(PostgresStrategy, StrategyConfig), ProvisionError> {
    let config = store
        .read_strategy(POSTGRES_RESOURCE_TYPE, tier)
        .await
        .map_err(|source| ProvisionError::ConfigUnavailable {
            resource_type: POSTGRES_RESOURCE_TYPE.to_string(),
            tier: tier.to_string(),
            source,
        })?;

    let strategy = PostgresStrategy::from_slice(&config.raw_strategy).map_err(|source| {
        ProvisionError::ConfigMalformed {
            resource_type: POSTGRES_RESOURCE_TYPE.to_string(),
            tier: tier.to_string(),
            source,
        }
    })?;

    debug!(
        tier,
        region = %config.region,
        deployment_override = strategy.deployment_spec.is_some(),
        service_override = strategy.service_spec.is_some(),
        pvc_override = strategy.pvc_spec.is_some(),
        secret_override = strategy.secret_data.is_some(),
        "Loaded postgres strategy"
    );

    Ok((strategy, config))
}
