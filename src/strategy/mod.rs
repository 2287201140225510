//! # Strategies
//!
//! Named, per-tier provisioning strategies and the store they are read from.
//!
//! A store returns raw strategy bytes for a `(resource type, tier)` pair;
//! [`load_postgres_strategy`] decodes them into a [`PostgresStrategy`].

mod configmap;
mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;

pub use configmap::{parse_strategy_entry, ConfigMapStrategyStore};
pub use memory::InMemoryStrategyStore;
pub use postgres::{load_postgres_strategy, PostgresStrategy};

/// Strategy for one resource type and tier as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrategyConfig {
    /// Region the strategy applies to; only logged for in-cluster provisioning
    pub region: String,
    /// Raw JSON document describing the strategy
    pub raw_strategy: Vec<u8>,
}

/// Backend holding named strategies
#[async_trait]
pub trait StrategyStore: Send + Sync {
    /// Look up the strategy for a resource type and tier
    async fn read_strategy(&self, resource_type: &str, tier: &str) -> Result<StrategyConfig>;
}
