//! Postgres Provisioner Library
//!
//! Provisions an in-cluster PostgreSQL workload for a `Postgres` resource:
//! a data volume claim, a credentials Secret, a Deployment and a Service,
//! customised per tier by strategies read from a ConfigMap.
//!
//! ## Quick Start
//!
//! ```rust
//! use postgres_provisioner::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod provisioner;
pub mod resources;
pub mod store;
pub mod strategy;
