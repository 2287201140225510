//! # Finalizer Registration
//!
//! The owning `Postgres` resource must carry the provisioner finalizer before
//! any object is created, so teardown can run before the resource disappears.

use kube::ResourceExt;
use tracing::info;

use crate::constants::DEFAULT_FINALIZER;
use crate::crd::Postgres;
use crate::store::ObjectStore;

use super::ProvisionError;

/// Add `finalizer` to the resource's finalizers, returning whether it was missing
pub fn add_finalizer(postgres: &mut Postgres, finalizer: &str) -> bool {
    if postgres.finalizers().iter().any(|f| f == finalizer) {
        return false;
    }
    postgres.finalizers_mut().push(finalizer.to_string());
    true
}

/// Ensure the finalizer is registered and persisted
///
/// Resources already marked for deletion are left alone. The resource is only
/// written when the finalizer was missing; returns whether a write happened.
pub async fn ensure_finalizer<S: ObjectStore>(
    store: &S,
    postgres: &Postgres,
) -> Result<bool, ProvisionError> {
    if postgres.metadata.deletion_timestamp.is_some() {
        return Ok(false);
    }

    let mut updated = postgres.clone();
    if !add_finalizer(&mut updated, DEFAULT_FINALIZER) {
        return Ok(false);
    }

    store
        .update_owner(&updated)
        .await
        .map_err(|source| ProvisionError::FinalizerUpdateFailed {
            namespace: postgres.namespace().unwrap_or_default(),
            name: postgres.name_any(),
            source,
        })?;

    info!(
        "Added finalizer {} to Postgres {}/{}",
        DEFAULT_FINALIZER,
        postgres.namespace().unwrap_or_default(),
        postgres.name_any()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::PostgresSpec;
    use crate::store::InMemoryObjectStore;

    fn postgres() -> Postgres {
        let mut pg = Postgres::new(
            "db1",
            PostgresSpec {
                type_: "openshift".to_string(),
                tier: "production".to_string(),
                secret_ref: None,
            },
        );
        pg.metadata.namespace = Some("ns1".to_string());
        pg
    }

    #[test]
    fn test_add_finalizer_is_idempotent() {
        let mut pg = postgres();
        assert!(add_finalizer(&mut pg, DEFAULT_FINALIZER));
        assert!(!add_finalizer(&mut pg, DEFAULT_FINALIZER));
        assert_eq!(pg.finalizers(), &[DEFAULT_FINALIZER.to_string()]);
    }

    #[tokio::test]
    async fn test_ensure_finalizer_persists_owner() {
        let store = InMemoryObjectStore::new();
        assert!(ensure_finalizer(&store, &postgres()).await.unwrap());

        let stored = store.owner("ns1", "db1").unwrap();
        assert!(stored.finalizers().contains(&DEFAULT_FINALIZER.to_string()));
    }

    #[tokio::test]
    async fn test_ensure_finalizer_skips_write_when_present() {
        let store = InMemoryObjectStore::new();
        let mut pg = postgres();
        add_finalizer(&mut pg, DEFAULT_FINALIZER);

        assert!(!ensure_finalizer(&store, &pg).await.unwrap());
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_finalizer_skips_deleting_resource() {
        let store = InMemoryObjectStore::new();
        store.fail_owner_updates();
        let mut pg = postgres();
        pg.metadata.deletion_timestamp =
            serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap();
        assert!(pg.metadata.deletion_timestamp.is_some());

        assert!(!ensure_finalizer(&store, &pg).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_finalizer_wraps_failure() {
        let store = InMemoryObjectStore::new();
        store.fail_owner_updates();

        let err = ensure_finalizer(&store, &postgres()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::FinalizerUpdateFailed { .. }));
        assert_eq!(err.to_string(), "Failed to add finalizer to Postgres ns1/db1");
    }
}
