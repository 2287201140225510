//! # Managed Resources
//!
//! The closed set of Kubernetes object kinds the provisioner owns.
//!
//! Each kind is a concrete k8s-openapi type implementing [`ManagedResource`],
//! which names the mutable portion the provisioner overwrites and where its
//! strategy override comes from. Nothing here downcasts at runtime.

mod defaults;
mod merge;

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, Secret, Service, ServiceSpec,
};
use k8s_openapi::{ByteString, NamespaceResourceScope};
use kube::ResourceExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crd::Postgres;
use crate::provisioner::ProvisionError;
use crate::strategy::PostgresStrategy;

pub use defaults::{
    build_default_claim, build_default_credentials, build_default_deployment,
    build_default_service,
};
pub use merge::merge_override;

/// Kinds of object reconciled for a postgres workload, in apply order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagedKind {
    /// Data volume claim
    StorageClaim,
    /// Shared credentials Secret
    Credentials,
    /// Deployment running the engine
    PodController,
    /// Service exposing the engine
    NetworkEndpoint,
}

impl ManagedKind {
    /// All kinds in the order they are applied
    pub const APPLY_ORDER: [ManagedKind; 4] = [
        ManagedKind::StorageClaim,
        ManagedKind::Credentials,
        ManagedKind::PodController,
        ManagedKind::NetworkEndpoint,
    ];

    /// Kubernetes kind name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedKind::StorageClaim => "PersistentVolumeClaim",
            ManagedKind::Credentials => "Secret",
            ManagedKind::PodController => "Deployment",
            ManagedKind::NetworkEndpoint => "Service",
        }
    }
}

impl fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced object the provisioner creates and overwrites
pub trait ManagedResource:
    kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + PartialEq
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// The portion of the object owned by the provisioner
    type Spec: Clone + PartialEq + fmt::Debug + Send + Sync;

    const KIND: ManagedKind;

    fn managed_spec(&self) -> Option<&Self::Spec>;

    fn set_managed_spec(&mut self, spec: Self::Spec);

    /// Override supplied by the strategy, if any
    fn strategy_override(strategy: &PostgresStrategy) -> Option<&Self::Spec>;
}

impl ManagedResource for PersistentVolumeClaim {
    type Spec = PersistentVolumeClaimSpec;

    const KIND: ManagedKind = ManagedKind::StorageClaim;

    fn managed_spec(&self) -> Option<&Self::Spec> {
        self.spec.as_ref()
    }

    fn set_managed_spec(&mut self, spec: Self::Spec) {
        self.spec = Some(spec);
    }

    fn strategy_override(strategy: &PostgresStrategy) -> Option<&Self::Spec> {
        strategy.pvc_spec.as_ref()
    }
}

impl ManagedResource for Secret {
    type Spec = BTreeMap<String, ByteString>;

    const KIND: ManagedKind = ManagedKind::Credentials;

    fn managed_spec(&self) -> Option<&Self::Spec> {
        self.data.as_ref()
    }

    fn set_managed_spec(&mut self, spec: Self::Spec) {
        self.data = Some(spec);
    }

    fn strategy_override(strategy: &PostgresStrategy) -> Option<&Self::Spec> {
        // An empty map carries no credentials; treat it like an absent override
        strategy.secret_data.as_ref().filter(|data| !data.is_empty())
    }
}

impl ManagedResource for Deployment {
    type Spec = DeploymentSpec;

    const KIND: ManagedKind = ManagedKind::PodController;

    fn managed_spec(&self) -> Option<&Self::Spec> {
        self.spec.as_ref()
    }

    fn set_managed_spec(&mut self, spec: Self::Spec) {
        self.spec = Some(spec);
    }

    fn strategy_override(strategy: &PostgresStrategy) -> Option<&Self::Spec> {
        strategy.deployment_spec.as_ref()
    }
}

impl ManagedResource for Service {
    type Spec = ServiceSpec;

    const KIND: ManagedKind = ManagedKind::NetworkEndpoint;

    fn managed_spec(&self) -> Option<&Self::Spec> {
        self.spec.as_ref()
    }

    fn set_managed_spec(&mut self, spec: Self::Spec) {
        self.spec = Some(spec);
    }

    fn strategy_override(strategy: &PostgresStrategy) -> Option<&Self::Spec> {
        strategy.service_spec.as_ref()
    }
}

/// Name and namespace of the workload being provisioned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadIdentity {
    pub name: String,
    pub namespace: String,
}

impl WorkloadIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Identity of a `Postgres` resource; both name and namespace must be set
    pub fn from_postgres(postgres: &Postgres) -> Result<Self, ProvisionError> {
        let name = postgres
            .metadata
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ProvisionError::InvalidResource("metadata.name is not set".into()))?;
        let namespace = postgres.namespace().filter(|n| !n.is_empty()).ok_or_else(|| {
            ProvisionError::InvalidResource(format!("Postgres {name} has no namespace"))
        })?;
        Ok(Self { name, namespace })
    }

    /// In-cluster DNS name of the workload's Service
    #[must_use]
    pub fn service_host(&self) -> String {
        format!("{}.{}.svc.cluster.local", self.name, self.namespace)
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
