//! # CRD Generator
//!
//! Generates the `Postgres` CustomResourceDefinition YAML from the Rust types.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/postgres.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use postgres_provisioner::crd::Postgres;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&Postgres::crd())?);
    Ok(())
}
