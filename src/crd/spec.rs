//! # Postgres Spec
//!
//! The `Postgres` custom resource that owns a provisioned workload.

use serde::{Deserialize, Serialize};

/// Postgres Custom Resource Definition
///
/// Requests a PostgreSQL instance of a given tier. The provisioner creates the
/// backing objects in the resource's namespace and registers a finalizer on it.
///
/// # Example
///
/// ```yaml
/// apiVersion: integreatly.org/v1alpha1
/// kind: Postgres
/// metadata:
///   name: db1
///   namespace: ns1
/// spec:
///   type: openshift
///   tier: production
///   secretRef:
///     name: db1-connection
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Postgres",
    group = "integreatly.org",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::PostgresStatus",
    printcolumn = r#"{"name":"Tier", "type":"string", "jsonPath":".spec.tier"}, {"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgresSpec {
    /// Deployment strategy type used to pick a provider (e.g. `openshift`)
    #[serde(rename = "type")]
    pub type_: String,
    /// Tier used to look up the provisioning strategy (e.g. `development`, `production`)
    pub tier: String,
    /// Secret the outer controller writes connection details to
    #[serde(default)]
    pub secret_ref: Option<SecretRef>,
}

/// Reference to a Secret, defaulting to the resource's namespace
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_spec_deserializes_type_and_tier() {
        let spec: PostgresSpec = serde_json::from_value(serde_json::json!({
            "type": "openshift",
            "tier": "production",
            "secretRef": { "name": "db1-connection" }
        }))
        .unwrap();

        assert_eq!(spec.type_, "openshift");
        assert_eq!(spec.tier, "production");
        assert_eq!(
            spec.secret_ref,
            Some(SecretRef {
                name: "db1-connection".to_string(),
                namespace: None
            })
        );
    }
}
