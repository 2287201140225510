//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use postgres_provisioner::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Provider surface
pub use crate::provider::{ConnectionDetails, PostgresInstance, PostgresProvider, ProvisionOutcome};

// Provisioner and its errors
pub use crate::provisioner::{AppliedObject, ProvisionError, Provisioner, Reconciliation};

// Backends
pub use crate::store::{ApplyAction, InMemoryObjectStore, KubeObjectStore, ObjectStore};
pub use crate::strategy::{
    ConfigMapStrategyStore, InMemoryStrategyStore, PostgresStrategy, StrategyStore,
};

// Config types
pub use crate::config::{PostgresDefaults, ProvisionerConfig};

pub use tokio_util::sync::CancellationToken;
