//! # Kubernetes Object Store
//!
//! [`ObjectStore`] over the API server using server-side apply.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use tracing::debug;

use crate::config::ProvisionerConfig;
use crate::crd::Postgres;
use crate::resources::ManagedResource;

use super::{ConflictError, ObjectStore};

/// Object store backed by a Kubernetes client
///
/// Managed objects are applied with server-side apply under a dedicated field
/// manager, forcing ownership of the fields the provisioner sets. Fields the
/// manager stops setting are removed by the API server, which gives the
/// all-or-nothing override semantics for free.
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeObjectStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeObjectStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    #[must_use]
    pub fn from_config(client: Client, config: &ProvisionerConfig) -> Self {
        Self::new(client, config.field_manager.clone())
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get<K: ManagedResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.context(format!(
            "Failed to get {} {}/{}",
            K::KIND,
            namespace,
            name
        ))
    }

    async fn apply<K: ManagedResource>(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        let namespace = object
            .namespace()
            .ok_or_else(|| anyhow!("{} {} has no namespace", K::KIND, name))?;

        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        let params = PatchParams::apply(&self.field_manager).force();

        let applied = api
            .patch(&name, &params, &Patch::Apply(object))
            .await
            .context(format!("Failed to apply {} {}/{}", K::KIND, namespace, name))?;

        debug!(
            "Applied {} {}/{} (resourceVersion {:?})",
            K::KIND,
            namespace,
            name,
            applied.resource_version()
        );
        Ok(applied)
    }

    async fn update_owner(&self, owner: &Postgres) -> Result<Postgres> {
        let name = owner.name_any();
        let namespace = owner
            .namespace()
            .ok_or_else(|| anyhow!("Postgres {} has no namespace", name))?;

        let api: Api<Postgres> = Api::namespaced(self.client.clone(), &namespace);
        match api.replace(&name, &PostParams::default(), owner).await {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(status)) if status.code == 409 => Err(ConflictError {
                kind: Postgres::kind(&()).into_owned(),
                namespace,
                name,
            }
            .into()),
            Err(e) => Err(e).context(format!("Failed to update Postgres {}/{}", namespace, name)),
        }
    }
}
