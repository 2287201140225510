//! # Override Merge
//!
//! A strategy override replaces the default's mutable spec wholesale. There is
//! no field-level merge: strategy authors supply complete specs.

use crate::strategy::PostgresStrategy;

use super::ManagedResource;

/// Desired object for `K`: the default, with its spec replaced by the
/// strategy's override when one is present
#[must_use]
pub fn merge_override<K: ManagedResource>(mut default: K, strategy: &PostgresStrategy) -> K {
    if let Some(spec) = K::strategy_override(strategy) {
        default.set_managed_spec(spec.clone());
    }
    default
}
