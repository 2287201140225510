//! # Configuration
//!
//! Provisioner settings and the defaults used to build managed objects.

mod defaults;
mod env;
mod provisioner;

pub use defaults::PostgresDefaults;
pub use provisioner::ProvisionerConfig;
