//! # Apply
//!
//! Create-or-update of a single managed object.

use kube::ResourceExt;
use tracing::{debug, info};

use crate::resources::{merge_override, ManagedKind, ManagedResource};
use crate::store::{ApplyAction, ObjectStore};
use crate::strategy::PostgresStrategy;

use super::ProvisionError;

/// Outcome of applying one managed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedObject {
    pub kind: ManagedKind,
    pub namespace: String,
    pub name: String,
    pub action: ApplyAction,
}

/// Apply the desired state of one object
///
/// The strategy override is merged into `default` here, at apply time. The
/// object is fetched first so the action can be reported: absent means
/// created; present means the managed spec is overwritten, and it counts as
/// updated only if the stored resource version moved.
pub async fn apply_object<S, K>(
    store: &S,
    default: K,
    strategy: &PostgresStrategy,
) -> Result<AppliedObject, ProvisionError>
where
    S: ObjectStore,
    K: ManagedResource,
{
    let desired = merge_override(default, strategy);
    let name = desired.name_any();
    let namespace = desired.namespace().unwrap_or_default();

    let wrap = |source: anyhow::Error| ProvisionError::ObjectApplyFailed {
        kind: K::KIND,
        namespace: namespace.clone(),
        name: name.clone(),
        source,
    };

    let existing: Option<K> = store.get(&namespace, &name).await.map_err(wrap)?;
    let applied = store.apply(&desired).await.map_err(wrap)?;

    let action = match existing {
        None => ApplyAction::Created,
        Some(current) if current.resource_version() == applied.resource_version() => {
            ApplyAction::Unchanged
        }
        Some(_) => ApplyAction::Updated,
    };

    if action.is_mutation() {
        info!("{} {}/{} {}", K::KIND, namespace, name, action);
    } else {
        debug!("{} {}/{} already up to date", K::KIND, namespace, name);
    }

    Ok(AppliedObject {
        kind: K::KIND,
        namespace,
        name,
        action,
    })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimSpec};

    use super::*;
    use crate::config::PostgresDefaults;
    use crate::resources::{build_default_claim, WorkloadIdentity};
    use crate::store::InMemoryObjectStore;

    fn claim() -> PersistentVolumeClaim {
        build_default_claim(
            &WorkloadIdentity::new("db1", "ns1"),
            &PostgresDefaults::default(),
        )
    }

    #[tokio::test]
    async fn test_created_then_unchanged() {
        let store = InMemoryObjectStore::new();
        let strategy = PostgresStrategy::default();

        let first = apply_object(&store, claim(), &strategy).await.unwrap();
        assert_eq!(first.action, ApplyAction::Created);
        assert_eq!(first.name, "postgresql-data");

        let second = apply_object(&store, claim(), &strategy).await.unwrap();
        assert_eq!(second.action, ApplyAction::Unchanged);
    }

    #[tokio::test]
    async fn test_override_change_reports_updated() {
        let store = InMemoryObjectStore::new();
        apply_object(&store, claim(), &PostgresStrategy::default())
            .await
            .unwrap();

        let override_spec = PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteMany".to_string()]),
            ..PersistentVolumeClaimSpec::default()
        };
        let strategy = PostgresStrategy {
            pvc_spec: Some(override_spec.clone()),
            ..PostgresStrategy::default()
        };

        let applied = apply_object(&store, claim(), &strategy).await.unwrap();
        assert_eq!(applied.action, ApplyAction::Updated);

        let stored: PersistentVolumeClaim =
            store.snapshot("ns1", "postgresql-data").unwrap().unwrap();
        assert_eq!(stored.spec, Some(override_spec));
    }

    #[tokio::test]
    async fn test_failure_is_wrapped_with_identity() {
        let store = InMemoryObjectStore::new();
        store.fail_applies_of(ManagedKind::StorageClaim);

        let err = apply_object(&store, claim(), &PostgresStrategy::default())
            .await
            .unwrap_err();
        match err {
            ProvisionError::ObjectApplyFailed {
                kind,
                namespace,
                name,
                ..
            } => {
                assert_eq!(kind, ManagedKind::StorageClaim);
                assert_eq!(namespace, "ns1");
                assert_eq!(name, "postgresql-data");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
