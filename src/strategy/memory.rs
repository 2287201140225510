//! In-memory strategy store serving fixed documents.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{StrategyConfig, StrategyStore};

#[derive(Debug, Clone, Default)]
pub struct InMemoryStrategyStore {
    strategies: BTreeMap<(String, String), StrategyConfig>,
}

impl InMemoryStrategyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw strategy document for a resource type and tier
    #[must_use]
    pub fn with_strategy(
        mut self,
        resource_type: &str,
        tier: &str,
        raw_strategy: impl Into<Vec<u8>>,
    ) -> Self {
        self.strategies.insert(
            (resource_type.to_string(), tier.to_string()),
            StrategyConfig {
                region: String::new(),
                raw_strategy: raw_strategy.into(),
            },
        );
        self
    }
}

#[async_trait]
impl StrategyStore for InMemoryStrategyStore {
    async fn read_strategy(&self, resource_type: &str, tier: &str) -> Result<StrategyConfig> {
        self.strategies
            .get(&(resource_type.to_string(), tier.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("no {resource_type} strategy configured for tier {tier}"))
    }
}
