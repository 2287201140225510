//! # Object Stores
//!
//! Typed get/apply access to the cluster's object store.
//!
//! The provisioner only ever needs three operations: read a managed object by
//! identity, apply a desired managed object, and persist the owning `Postgres`
//! resource. [`KubeObjectStore`] talks to the API server; [`InMemoryObjectStore`]
//! emulates the same semantics for tests and dry runs.

mod kube_store;
mod memory;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::crd::Postgres;
use crate::resources::ManagedResource;

pub use kube_store::KubeObjectStore;
pub use memory::{InMemoryObjectStore, JournalEntry};

/// What applying an object did to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyAction {
    /// Object already matched the desired state
    Unchanged,
    /// Object did not exist and was created
    Created,
    /// Object existed and its managed spec was overwritten
    Updated,
}

impl ApplyAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyAction::Unchanged => "unchanged",
            ApplyAction::Created => "created",
            ApplyAction::Updated => "updated",
        }
    }

    /// Whether the cluster was mutated
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ApplyAction::Unchanged)
    }
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimistic-concurrency conflict: the object changed since it was read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Operation cannot be fulfilled on {kind} {namespace}/{name}: the object has been modified")]
pub struct ConflictError {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Cluster object store
///
/// `apply` owns only the managed spec of the object: fields set by the cluster
/// or by other managers (uids, assigned IPs, status) are preserved.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, `None` if it does not exist
    async fn get<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// Create the object, or overwrite the managed spec of the existing one,
    /// returning the object as stored
    async fn apply<K: ManagedResource>(&self, object: &K) -> Result<K>;

    /// Persist metadata changes (finalizers) on the owning resource
    ///
    /// Uses optimistic concurrency: a stale `resourceVersion` fails with a
    /// [`ConflictError`] in the error chain.
    async fn update_owner(&self, owner: &Postgres) -> Result<Postgres>;
}
