//! # Postgres Defaults
//!
//! Immutable values the default object builders are parameterized with.

use crate::constants::{
    DEFAULT_CREDENTIALS_SECRET, DEFAULT_DATA_CLAIM, DEFAULT_DATA_MOUNT_PATH,
    DEFAULT_POSTGRES_IMAGE, DEFAULT_POSTGRES_PASSWORD, DEFAULT_POSTGRES_PORT,
    DEFAULT_POSTGRES_USER, DEFAULT_STORAGE_REQUEST,
};

use super::env::env_var_or_default_str;

/// Defaults for the postgres workload
///
/// Passed by reference into every builder so tests can substitute values
/// without touching process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresDefaults {
    /// Port the engine listens on and the Service exposes
    pub port: i32,
    /// Database user, used both as Secret key and value
    pub user: String,
    /// Database password, used both as Secret key and value
    pub password: String,
    /// Name of the shared credentials Secret
    pub credentials_secret: String,
    /// Name of the data PersistentVolumeClaim
    pub data_claim: String,
    /// Storage request of the data claim
    pub storage_request: String,
    /// Mount path of the data volume
    pub data_mount_path: String,
    /// Engine image
    pub image: String,
}

impl Default for PostgresDefaults {
    fn default() -> Self {
        Self {
            port: DEFAULT_POSTGRES_PORT,
            user: DEFAULT_POSTGRES_USER.to_string(),
            password: DEFAULT_POSTGRES_PASSWORD.to_string(),
            credentials_secret: DEFAULT_CREDENTIALS_SECRET.to_string(),
            data_claim: DEFAULT_DATA_CLAIM.to_string(),
            storage_request: DEFAULT_STORAGE_REQUEST.to_string(),
            data_mount_path: DEFAULT_DATA_MOUNT_PATH.to_string(),
            image: DEFAULT_POSTGRES_IMAGE.to_string(),
        }
    }
}

impl PostgresDefaults {
    /// Load defaults, allowing the image and storage request to be overridden
    /// via `POSTGRES_IMAGE` and `POSTGRES_STORAGE_REQUEST`
    pub fn from_env() -> Self {
        Self {
            image: env_var_or_default_str("POSTGRES_IMAGE", DEFAULT_POSTGRES_IMAGE),
            storage_request: env_var_or_default_str(
                "POSTGRES_STORAGE_REQUEST",
                DEFAULT_STORAGE_REQUEST,
            ),
            ..Self::default()
        }
    }
}
