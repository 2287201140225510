//! # Postgres Status
//!
//! Status written by the outer controller once provisioning settles.

use serde::{Deserialize, Serialize};

use super::SecretRef;

#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostgresStatus {
    /// Current phase
    /// Values: Pending, InProgress, Complete, Failed
    #[serde(default)]
    pub phase: Option<String>,
    /// Human-readable description of the current state
    #[serde(default)]
    pub message: Option<String>,
    /// Provider that handled the resource
    #[serde(default)]
    pub provider: Option<String>,
    /// Secret holding the connection details once available
    #[serde(default)]
    pub secret_ref: Option<SecretRef>,
}
