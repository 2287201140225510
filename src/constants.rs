//! # Constants
//!
//! Shared constants used throughout the provisioner.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Resource type tag used to look up postgres strategies
pub const POSTGRES_RESOURCE_TYPE: &str = "postgres";

/// Deployment strategy type served by the in-cluster provider
pub const OPENSHIFT_DEPLOYMENT_STRATEGY: &str = "openshift";

/// Finalizer registered on every `Postgres` resource before provisioning begins
pub const DEFAULT_FINALIZER: &str = "cloud-resources-operator.integreatly.org/finalizers";

/// ConfigMap holding the per-tier strategies for the in-cluster provider
pub const DEFAULT_STRATEGY_CONFIGMAP: &str = "cloud-resources-openshift-strategies";

/// Namespace the strategy ConfigMap is read from when `POD_NAMESPACE` is unset
pub const DEFAULT_PROVISIONER_NAMESPACE: &str = "cloud-resource-operator";

/// Field manager used for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "postgres-provisioner";

/// Default PostgreSQL port
pub const DEFAULT_POSTGRES_PORT: i32 = 5432;

/// Default database user, also the Secret key holding it
pub const DEFAULT_POSTGRES_USER: &str = "user";

/// Default database password, also the Secret key holding it
pub const DEFAULT_POSTGRES_PASSWORD: &str = "password";

/// Secret shared by every postgres workload in a namespace
pub const DEFAULT_CREDENTIALS_SECRET: &str = "postgres-credentials";

/// PersistentVolumeClaim (and pod volume) holding the database files
pub const DEFAULT_DATA_CLAIM: &str = "postgresql-data";

/// Storage requested by the default claim
pub const DEFAULT_STORAGE_REQUEST: &str = "1Gi";

/// Mount path of the data volume inside the database container
pub const DEFAULT_DATA_MOUNT_PATH: &str = "/var/lib/pgsql/data";

/// Database engine image
pub const DEFAULT_POSTGRES_IMAGE: &str = "registry.redhat.io/rhscl/postgresql-96-rhel7";

/// Label used by the Deployment selector and the Service selector
pub const WORKLOAD_SELECTOR_LABEL: &str = "deployment";

/// Port name exposed by the Service
pub const POSTGRES_PORT_NAME: &str = "postgresql";

/// Deployment condition type signalling availability
pub const DEPLOYMENT_AVAILABLE_CONDITION: &str = "Available";

/// Key of the connection URI in the produced connection details
pub const CONNECTION_URI_KEY: &str = "uri";
