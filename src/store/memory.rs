//! # In-Memory Object Store
//!
//! Emulates the apply semantics of [`KubeObjectStore`](super::KubeObjectStore)
//! without a cluster: objects are kept as JSON, an apply overwrites only the
//! managed spec, and the resource version is bumped only when content changed.
//! Every mutation is recorded in a journal so callers can assert on ordering
//! and idempotence. Failures can be injected per kind and for owner updates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};
use kube::{Resource, ResourceExt};

use crate::constants::DEPLOYMENT_AVAILABLE_CONDITION;
use crate::crd::Postgres;
use crate::resources::{ManagedKind, ManagedResource};

use super::{ApplyAction, ConflictError, ObjectStore};

/// One recorded mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub action: ApplyAction,
}

type ObjectKey = (String, String, String);

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<ObjectKey, serde_json::Value>,
    owners: BTreeMap<(String, String), Postgres>,
    journal: Vec<JournalEntry>,
    failing_kinds: BTreeSet<ManagedKind>,
    fail_owner_updates: bool,
    last_version: u64,
}

impl MemoryState {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }

    fn record(&mut self, kind: &str, namespace: &str, name: &str, action: ApplyAction) {
        self.journal.push(JournalEntry {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            action,
        });
    }
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    state: Mutex<MemoryState>,
}

fn object_key<K: ManagedResource>(namespace: &str, name: &str) -> ObjectKey {
    (
        K::KIND.as_str().to_string(),
        namespace.to_string(),
        name.to_string(),
    )
}

impl InMemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every apply of `kind` fail
    pub fn fail_applies_of(&self, kind: ManagedKind) {
        self.lock().failing_kinds.insert(kind);
    }

    /// Make every owner update fail
    pub fn fail_owner_updates(&self) {
        self.lock().fail_owner_updates = true;
    }

    /// Clear all injected failures
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_kinds.clear();
        state.fail_owner_updates = false;
    }

    /// Mutations recorded so far, oldest first
    #[must_use]
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    /// Read a stored object without going through the async trait
    pub fn snapshot<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        self.lock()
            .objects
            .get(&object_key::<K>(namespace, name))
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .context(format!("Failed to decode stored {} {}/{}", K::KIND, namespace, name))
    }

    /// Last persisted version of an owning resource
    #[must_use]
    pub fn owner(&self, namespace: &str, name: &str) -> Option<Postgres> {
        self.lock()
            .owners
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Store an object as if created out of band, without journaling it
    pub fn seed<K: ManagedResource>(&self, mut object: K) -> Result<()> {
        let name = object.name_any();
        let namespace = object
            .namespace()
            .ok_or_else(|| anyhow!("{} {} has no namespace", K::KIND, name))?;

        let mut state = self.lock();
        let version = state.next_version();
        let meta = object.meta_mut();
        meta.resource_version = Some(version);
        meta.uid.get_or_insert_with(|| format!("seeded-{namespace}-{name}"));
        state
            .objects
            .insert(object_key::<K>(&namespace, &name), serde_json::to_value(&object)?);
        Ok(())
    }

    /// Set the `Available` condition on a stored Deployment, as the cluster's
    /// deployment controller would. Status changes are not journaled.
    pub fn set_deployment_available(
        &self,
        namespace: &str,
        name: &str,
        available: bool,
    ) -> Result<()> {
        let key = object_key::<Deployment>(namespace, name);
        let mut state = self.lock();
        let value = state
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("Deployment {namespace}/{name} not found"))?;

        let mut deployment: Deployment = serde_json::from_value(value)?;
        deployment.status = Some(DeploymentStatus {
            conditions: Some(vec![DeploymentCondition {
                type_: DEPLOYMENT_AVAILABLE_CONDITION.to_string(),
                status: if available { "True" } else { "False" }.to_string(),
                reason: Some("MinimumReplicasAvailable".to_string()),
                ..DeploymentCondition::default()
            }]),
            ..DeploymentStatus::default()
        });
        state.objects.insert(key, serde_json::to_value(&deployment)?);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        self.snapshot(namespace, name)
    }

    async fn apply<K: ManagedResource>(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        let namespace = object
            .namespace()
            .ok_or_else(|| anyhow!("{} {} has no namespace", K::KIND, name))?;
        let key = object_key::<K>(&namespace, &name);

        let mut state = self.lock();
        if state.failing_kinds.contains(&K::KIND) {
            bail!("injected failure applying {} {}/{}", K::KIND, namespace, name);
        }

        let existing = state
            .objects
            .get(&key)
            .map(|value| serde_json::from_value::<K>(value.clone()))
            .transpose()?;

        let (stored, action) = match existing {
            None => {
                let mut created = object.clone();
                let version = state.next_version();
                let meta = created.meta_mut();
                meta.resource_version = Some(version);
                meta.uid = Some(format!("{namespace}-{name}-{}", K::KIND.as_str().to_lowercase()));
                (created, ApplyAction::Created)
            }
            Some(current) => {
                let mut updated = current.clone();
                if let Some(spec) = object.managed_spec() {
                    updated.set_managed_spec(spec.clone());
                }
                if updated == current {
                    (current, ApplyAction::Unchanged)
                } else {
                    updated.meta_mut().resource_version = Some(state.next_version());
                    (updated, ApplyAction::Updated)
                }
            }
        };

        if action.is_mutation() {
            state.objects.insert(key, serde_json::to_value(&stored)?);
            state.record(K::KIND.as_str(), &namespace, &name, action);
        }
        Ok(stored)
    }

    async fn update_owner(&self, owner: &Postgres) -> Result<Postgres> {
        let name = owner.name_any();
        let namespace = owner
            .namespace()
            .ok_or_else(|| anyhow!("Postgres {name} has no namespace"))?;
        let key = (namespace.clone(), name.clone());

        let mut state = self.lock();
        if state.fail_owner_updates {
            bail!("injected failure updating Postgres {namespace}/{name}");
        }

        if let Some(stored) = state.owners.get(&key) {
            if owner.resource_version().is_some()
                && stored.resource_version() != owner.resource_version()
            {
                return Err(ConflictError {
                    kind: Postgres::kind(&()).into_owned(),
                    namespace,
                    name,
                }
                .into());
            }
        }

        let mut updated = owner.clone();
        updated.meta_mut().resource_version = Some(state.next_version());
        state.owners.insert(key, updated.clone());
        state.record(
            &Postgres::kind(&()),
            &namespace,
            &name,
            ApplyAction::Updated,
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Secret;
    use k8s_openapi::ByteString;

    use super::*;
    use crate::config::PostgresDefaults;
    use crate::resources::{build_default_credentials, build_default_deployment, WorkloadIdentity};

    fn workload() -> WorkloadIdentity {
        WorkloadIdentity::new("db1", "ns1")
    }

    #[tokio::test]
    async fn test_apply_creates_then_reports_unchanged() {
        let store = InMemoryObjectStore::new();
        let secret = build_default_credentials(&workload(), &PostgresDefaults::default());

        let created = store.apply(&secret).await.unwrap();
        assert!(created.metadata.uid.is_some());
        let second = store.apply(&secret).await.unwrap();
        assert_eq!(second.metadata.resource_version, created.metadata.resource_version);

        let actions: Vec<ApplyAction> = store.journal().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ApplyAction::Created]);
    }

    #[tokio::test]
    async fn test_apply_overwrites_only_managed_spec() {
        let store = InMemoryObjectStore::new();
        let mut existing = build_default_credentials(&workload(), &PostgresDefaults::default());
        existing.metadata.labels = Some(BTreeMap::from([("team".to_string(), "db".to_string())]));
        existing.data = Some(BTreeMap::from([(
            "user".to_string(),
            ByteString(b"edited".to_vec()),
        )]));
        store.seed(existing).unwrap();

        let desired = build_default_credentials(&workload(), &PostgresDefaults::default());
        let applied: Secret = store.apply(&desired).await.unwrap();

        assert_eq!(applied.data, desired.data);
        assert_eq!(
            applied.metadata.labels.unwrap().get("team"),
            Some(&"db".to_string())
        );
        assert_eq!(
            applied.metadata.uid.as_deref(),
            Some("seeded-ns1-postgres-credentials")
        );
        assert_eq!(store.journal()[0].action, ApplyAction::Updated);
    }

    #[tokio::test]
    async fn test_apply_preserves_status() {
        let store = InMemoryObjectStore::new();
        let deployment = build_default_deployment(&workload(), &PostgresDefaults::default());
        store.apply(&deployment).await.unwrap();
        store.set_deployment_available("ns1", "db1", true).unwrap();

        let applied = store.apply(&deployment).await.unwrap();
        assert!(applied.status.is_some());
    }

    #[tokio::test]
    async fn test_injected_apply_failure() {
        let store = InMemoryObjectStore::new();
        store.fail_applies_of(ManagedKind::Credentials);
        let secret = build_default_credentials(&workload(), &PostgresDefaults::default());

        let err = store.apply(&secret).await.unwrap_err();
        assert!(err.to_string().contains("injected failure applying Secret"));
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_owner_update_detects_stale_version() {
        let store = InMemoryObjectStore::new();
        let mut owner = Postgres::new(
            "db1",
            crate::crd::PostgresSpec {
                type_: "openshift".to_string(),
                tier: "production".to_string(),
                secret_ref: None,
            },
        );
        owner.metadata.namespace = Some("ns1".to_string());

        let first = store.update_owner(&owner).await.unwrap();
        store.update_owner(&first).await.unwrap();

        let err = store.update_owner(&first).await.unwrap_err();
        assert!(err.to_string().contains("has been modified"));
        assert_eq!(
            err.downcast_ref::<ConflictError>().map(|c| c.name.as_str()),
            Some("db1")
        );
    }
}
