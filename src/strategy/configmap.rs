//! # ConfigMap Strategy Store
//!
//! Reads strategies from a ConfigMap in the provisioner namespace.
//!
//! Each data key is a resource type whose value is a JSON map of tiers:
//!
//! ```json
//! {
//!   "development": { "region": "", "strategy": {} },
//!   "production": { "region": "", "strategy": { "PostgresPVCSpec": { ... } } }
//! }
//! ```

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client};
use serde::Deserialize;
use tracing::debug;

use crate::config::ProvisionerConfig;

use super::{StrategyConfig, StrategyStore};

#[derive(Debug, Deserialize)]
struct TierEntry {
    #[serde(default)]
    region: String,
    #[serde(default, alias = "createStrategy")]
    strategy: Option<serde_json::Value>,
}

/// Strategy store backed by a Kubernetes ConfigMap
#[derive(Clone)]
pub struct ConfigMapStrategyStore {
    client: Client,
    namespace: String,
    configmap_name: String,
}

impl std::fmt::Debug for ConfigMapStrategyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMapStrategyStore")
            .field("namespace", &self.namespace)
            .field("configmap_name", &self.configmap_name)
            .finish_non_exhaustive()
    }
}

impl ConfigMapStrategyStore {
    pub fn new(
        client: Client,
        namespace: impl Into<String>,
        configmap_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            configmap_name: configmap_name.into(),
        }
    }

    #[must_use]
    pub fn from_config(client: Client, config: &ProvisionerConfig) -> Self {
        Self::new(
            client,
            config.namespace.clone(),
            config.strategy_configmap_name.clone(),
        )
    }
}

#[async_trait]
impl StrategyStore for ConfigMapStrategyStore {
    async fn read_strategy(&self, resource_type: &str, tier: &str) -> Result<StrategyConfig> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);

        let configmap = api
            .get_opt(&self.configmap_name)
            .await
            .context(format!(
                "Failed to get strategy ConfigMap {}/{}",
                self.namespace, self.configmap_name
            ))?
            .ok_or_else(|| {
                anyhow!(
                    "strategy ConfigMap {}/{} not found",
                    self.namespace,
                    self.configmap_name
                )
            })?;

        debug!(
            "Read strategy ConfigMap {}/{} for {} tier {}",
            self.namespace, self.configmap_name, resource_type, tier
        );

        parse_strategy_entry(
            &configmap.data.unwrap_or_default(),
            resource_type,
            tier,
        )
    }
}

/// Extract the strategy for `resource_type` and `tier` from ConfigMap data
///
/// A tier without a `strategy` field yields an empty strategy document (`{}`).
pub fn parse_strategy_entry(
    data: &BTreeMap<String, String>,
    resource_type: &str,
    tier: &str,
) -> Result<StrategyConfig> {
    let raw_tiers = data
        .get(resource_type)
        .ok_or_else(|| anyhow!("no strategies defined for resource type {resource_type}"))?;

    let mut tiers: BTreeMap<String, TierEntry> = serde_json::from_str(raw_tiers)
        .context(format!("Failed to parse {resource_type} strategy tiers"))?;

    let entry = tiers
        .remove(tier)
        .ok_or_else(|| anyhow!("no {resource_type} strategy defined for tier {tier}"))?;

    let strategy = entry
        .strategy
        .filter(|value| !value.is_null())
        .unwrap_or_else(|| serde_json::json!({}));

    Ok(StrategyConfig {
        region: entry.region,
        raw_strategy: serde_json::to_vec(&strategy)?,
    })
}
