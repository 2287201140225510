//! # Default Objects
//!
//! Baseline objects for a postgres workload. Pure functions of the workload
//! identity and [`PostgresDefaults`].

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, ExecAction, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec,
    Probe, Secret, SecretKeySelector, Service, ServicePort, ServiceSpec, TCPSocketAction, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::ByteString;

use crate::config::PostgresDefaults;
use crate::constants::{POSTGRES_PORT_NAME, WORKLOAD_SELECTOR_LABEL};

use super::WorkloadIdentity;

const READINESS_QUERY: &str =
    "psql -h 127.0.0.1 -U $POSTGRESQL_USER -q -d $POSTGRESQL_DATABASE -c 'SELECT 1'";

fn object_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..ObjectMeta::default()
    }
}

fn selector_labels(workload: &WorkloadIdentity) -> BTreeMap<String, String> {
    BTreeMap::from([(
        WORKLOAD_SELECTOR_LABEL.to_string(),
        workload.name.clone(),
    )])
}

/// Data volume claim: ReadWriteOnce with the configured storage request
#[must_use]
pub fn build_default_claim(
    workload: &WorkloadIdentity,
    defaults: &PostgresDefaults,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: object_meta(&defaults.data_claim, &workload.namespace),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(defaults.storage_request.clone()),
                )])),
                ..VolumeResourceRequirements::default()
            }),
            ..PersistentVolumeClaimSpec::default()
        }),
        ..PersistentVolumeClaim::default()
    }
}

/// Shared credentials Secret holding the default user/password pair
///
/// Stored as `data` rather than `stringData` so the applied object reads back
/// identically and repeated applies compare equal.
#[must_use]
pub fn build_default_credentials(
    workload: &WorkloadIdentity,
    defaults: &PostgresDefaults,
) -> Secret {
    Secret {
        metadata: object_meta(&defaults.credentials_secret, &workload.namespace),
        data: Some(BTreeMap::from([
            (
                "user".to_string(),
                ByteString(defaults.user.as_bytes().to_vec()),
            ),
            (
                "password".to_string(),
                ByteString(defaults.password.as_bytes().to_vec()),
            ),
        ])),
        type_: Some("Opaque".to_string()),
        ..Secret::default()
    }
}

/// Single-replica Deployment running the engine
///
/// Uses the `Recreate` strategy: two engine instances must never share the
/// ReadWriteOnce data volume during a rollout.
#[must_use]
pub fn build_default_deployment(
    workload: &WorkloadIdentity,
    defaults: &PostgresDefaults,
) -> Deployment {
    let labels = selector_labels(workload);

    Deployment {
        metadata: object_meta(&workload.name, &workload.namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..DeploymentStrategy::default()
            }),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    volumes: Some(vec![Volume {
                        name: defaults.data_claim.clone(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: defaults.data_claim.clone(),
                            ..PersistentVolumeClaimVolumeSource::default()
                        }),
                        ..Volume::default()
                    }]),
                    containers: build_default_containers(workload, defaults),
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

fn build_default_containers(
    workload: &WorkloadIdentity,
    defaults: &PostgresDefaults,
) -> Vec<Container> {
    vec![Container {
        name: workload.name.clone(),
        image: Some(defaults.image.clone()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        ports: Some(vec![ContainerPort {
            container_port: defaults.port,
            protocol: Some("TCP".to_string()),
            ..ContainerPort::default()
        }]),
        env: Some(vec![
            env_var_from_secret("POSTGRESQL_USER", &defaults.credentials_secret, "user"),
            env_var_from_secret(
                "POSTGRESQL_PASSWORD",
                &defaults.credentials_secret,
                "password",
            ),
            env_var_from_value("POSTGRESQL_DATABASE", &workload.name),
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: defaults.data_claim.clone(),
            mount_path: defaults.data_mount_path.clone(),
            ..VolumeMount::default()
        }]),
        liveness_probe: Some(Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::Int(defaults.port),
                ..TCPSocketAction::default()
            }),
            initial_delay_seconds: Some(30),
            period_seconds: Some(10),
            ..Probe::default()
        }),
        readiness_probe: Some(Probe {
            exec: Some(ExecAction {
                command: Some(vec![
                    "/bin/sh".to_string(),
                    "-i".to_string(),
                    "-c".to_string(),
                    READINESS_QUERY.to_string(),
                ]),
            }),
            initial_delay_seconds: Some(10),
            period_seconds: Some(30),
            timeout_seconds: Some(5),
            ..Probe::default()
        }),
        ..Container::default()
    }]
}

/// Service mapping the engine port to the Deployment's pods
#[must_use]
pub fn build_default_service(workload: &WorkloadIdentity, defaults: &PostgresDefaults) -> Service {
    Service {
        metadata: object_meta(&workload.name, &workload.namespace),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some(POSTGRES_PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                port: defaults.port,
                target_port: Some(IntOrString::Int(defaults.port)),
                ..ServicePort::default()
            }]),
            selector: Some(selector_labels(workload)),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}

fn env_var_from_value(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..EnvVar::default()
    }
}

fn env_var_from_secret(name: &str, secret_name: &str, secret_key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret_name.to_string(),
                key: secret_key.to_string(),
                ..SecretKeySelector::default()
            }),
            ..EnvVarSource::default()
        }),
        ..EnvVar::default()
    }
}
