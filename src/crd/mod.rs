//! # Custom Resource Definitions
//!
//! CRD types owned by the provisioner's caller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - The `Postgres` resource and its spec
//! - `status.rs` - Status reported back on the resource

mod spec;
mod status;

pub use spec::{Postgres, PostgresSpec, SecretRef};
pub use status::PostgresStatus;
