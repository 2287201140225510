//! Shared fixtures for provisioner integration tests.

#![allow(dead_code, reason = "Not every test binary uses every fixture")]

use postgres_provisioner::prelude::*;

/// A `Postgres` resource as the outer controller would hand it over
pub fn postgres(name: &str, namespace: &str, tier: &str) -> Postgres {
    let mut pg = Postgres::new(
        name,
        PostgresSpec {
            type_: "openshift".to_string(),
            tier: tier.to_string(),
            secret_ref: None,
        },
    );
    pg.metadata.namespace = Some(namespace.to_string());
    pg
}

pub type TestProvisioner = Provisioner<InMemoryObjectStore, InMemoryStrategyStore>;

/// Provisioner whose store serves `raw_strategy` for the given tier
pub fn provisioner_with_strategy(tier: &str, raw_strategy: &str) -> TestProvisioner {
    Provisioner::new(
        InMemoryObjectStore::new(),
        InMemoryStrategyStore::new().with_strategy("postgres", tier, raw_strategy),
        PostgresDefaults::default(),
    )
}

/// Provisioner with an empty strategy for `production`
pub fn provisioner() -> TestProvisioner {
    provisioner_with_strategy("production", "{}")
}
