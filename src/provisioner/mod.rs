//! # Provisioner
//!
//! Reconciles a `Postgres` resource into the four in-cluster objects that run
//! it, then reports whether the workload is ready.
//!
//! ## Flow
//!
//! 1. Register the finalizer on the owning resource
//! 2. Load the tier's strategy overrides
//! 3. Apply claim, credentials, deployment and service, in that order
//! 4. Evaluate readiness from the Deployment's conditions
//!
//! Every step is idempotent and nothing is retried here: a failed or pending
//! call is simply made again by the caller.

mod apply;
mod error;
mod finalizer;
mod readiness;

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use kube::{Client, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::{PostgresDefaults, ProvisionerConfig};
use crate::constants::{OPENSHIFT_DEPLOYMENT_STRATEGY, POSTGRES_RESOURCE_TYPE};
use crate::crd::Postgres;
use crate::observability::metrics;
use crate::provider::{PostgresProvider, ProvisionOutcome};
use crate::resources::{
    build_default_claim, build_default_credentials, build_default_deployment,
    build_default_service, ManagedKind, WorkloadIdentity,
};
use crate::store::{KubeObjectStore, ObjectStore};
use crate::strategy::{
    load_postgres_strategy, ConfigMapStrategyStore, PostgresStrategy, StrategyStore,
};

pub use apply::{apply_object, AppliedObject};
pub use error::ProvisionError;
pub use finalizer::{add_finalizer, ensure_finalizer};
pub use readiness::{
    build_connection_details, connection_uri, deployment_available, evaluate_readiness,
};

/// Everything one reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Whether the finalizer had to be written
    pub finalizer_added: bool,
    /// Applied objects, in apply order
    pub applied: Vec<AppliedObject>,
    pub outcome: ProvisionOutcome,
}

/// In-cluster postgres provisioner
#[derive(Debug)]
pub struct Provisioner<S, C> {
    objects: S,
    strategies: C,
    defaults: PostgresDefaults,
    metrics_enabled: bool,
}

impl Provisioner<KubeObjectStore, ConfigMapStrategyStore> {
    /// Provisioner backed by the API server
    #[must_use]
    pub fn from_client(client: Client, config: &ProvisionerConfig) -> Self {
        Self::new(
            KubeObjectStore::from_config(client.clone(), config),
            ConfigMapStrategyStore::from_config(client, config),
            config.defaults.clone(),
        )
        .with_metrics(config.enable_metrics)
    }
}

impl<S, C> Provisioner<S, C>
where
    S: ObjectStore,
    C: StrategyStore,
{
    /// New provisioner with metrics recording enabled
    pub fn new(objects: S, strategies: C, defaults: PostgresDefaults) -> Self {
        Self {
            objects,
            strategies,
            defaults,
            metrics_enabled: true,
        }
    }

    /// Turn Prometheus recording on or off
    #[must_use]
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn objects(&self) -> &S {
        &self.objects
    }

    pub fn defaults(&self) -> &PostgresDefaults {
        &self.defaults
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Run one reconciliation pass for `postgres`
    ///
    /// Returns `Pending` in the outcome while the Deployment is not available.
    /// The call is aborted with [`ProvisionError::Cancelled`] as soon as `cancel`
    /// fires; objects applied before that point stay in place.
    #[instrument(
        skip(self, postgres, cancel),
        fields(
            name = %postgres.name_any(),
            namespace = %postgres.namespace().unwrap_or_default(),
            tier = %postgres.spec.tier
        )
    )]
    pub async fn reconcile(
        &self,
        postgres: &Postgres,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation, ProvisionError> {
        let start = Instant::now();
        let result = self.reconcile_inner(postgres, cancel).await;

        if let Err(e) = &result {
            if e.is_conflict() {
                warn!("Reconciliation hit a concurrent update, will be retried: {}", e);
            } else if e.is_retryable() {
                warn!("Reconciliation failed, will be retried: {}", e);
            } else {
                error!("Reconciliation failed permanently: {}", e);
            }
        }

        if self.metrics_enabled {
            record_metrics(&result, start.elapsed().as_secs_f64());
        }
        result
    }

    async fn reconcile_inner(
        &self,
        postgres: &Postgres,
        cancel: &CancellationToken,
    ) -> Result<Reconciliation, ProvisionError> {
        let workload = WorkloadIdentity::from_postgres(postgres)?;

        let finalizer_added = cancellable(
            cancel,
            "finalizer registration",
            ensure_finalizer(&self.objects, postgres),
        )
        .await?;

        let (strategy, _) = cancellable(
            cancel,
            "strategy lookup",
            load_postgres_strategy(&self.strategies, &postgres.spec.tier),
        )
        .await?;

        let mut applied = Vec::with_capacity(ManagedKind::APPLY_ORDER.len());
        for kind in ManagedKind::APPLY_ORDER {
            applied.push(
                cancellable(
                    cancel,
                    apply_operation(kind),
                    self.apply_kind(kind, &workload, &strategy),
                )
                .await?,
            );
        }

        let outcome = cancellable(
            cancel,
            "readiness check",
            evaluate_readiness(&self.objects, &workload, &self.defaults),
        )
        .await?;

        Ok(Reconciliation {
            finalizer_added,
            applied,
            outcome,
        })
    }

    /// Build the default object of `kind` and apply it with the strategy override
    async fn apply_kind(
        &self,
        kind: ManagedKind,
        workload: &WorkloadIdentity,
        strategy: &PostgresStrategy,
    ) -> Result<AppliedObject, ProvisionError> {
        let defaults = &self.defaults;
        match kind {
            ManagedKind::StorageClaim => {
                apply_object(&self.objects, build_default_claim(workload, defaults), strategy)
                    .await
            }
            ManagedKind::Credentials => {
                apply_object(
                    &self.objects,
                    build_default_credentials(workload, defaults),
                    strategy,
                )
                .await
            }
            ManagedKind::PodController => {
                apply_object(
                    &self.objects,
                    build_default_deployment(workload, defaults),
                    strategy,
                )
                .await
            }
            ManagedKind::NetworkEndpoint => {
                apply_object(&self.objects, build_default_service(workload, defaults), strategy)
                    .await
            }
        }
    }
}

fn apply_operation(kind: ManagedKind) -> &'static str {
    match kind {
        ManagedKind::StorageClaim => "claim apply",
        ManagedKind::Credentials => "credentials apply",
        ManagedKind::PodController => "deployment apply",
        ManagedKind::NetworkEndpoint => "service apply",
    }
}

fn record_metrics(result: &Result<Reconciliation, ProvisionError>, duration: f64) {
    metrics::increment_reconciliations();
    metrics::observe_reconciliation_duration(duration);
    match result {
        Ok(reconciliation) => {
            for object in &reconciliation.applied {
                metrics::record_object_applied(object.kind.as_str(), object.action.as_str());
            }
            metrics::record_outcome(reconciliation.outcome.as_str());
        }
        Err(e) => metrics::increment_reconciliation_errors(e.reason()),
    }
}

#[async_trait]
impl<S, C> PostgresProvider for Provisioner<S, C>
where
    S: ObjectStore,
    C: StrategyStore,
{
    fn name(&self) -> &'static str {
        OPENSHIFT_DEPLOYMENT_STRATEGY
    }

    fn supports_strategy(&self, deployment_strategy: &str) -> bool {
        deployment_strategy == OPENSHIFT_DEPLOYMENT_STRATEGY
    }

    async fn create_postgres(
        &self,
        postgres: &Postgres,
        cancel: &CancellationToken,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        self.reconcile(postgres, cancel)
            .await
            .map(|reconciliation| reconciliation.outcome)
    }

    async fn delete_postgres(&self, postgres: &Postgres) -> Result<(), ProvisionError> {
        // Managed objects are namespace-scoped and go with the namespace
        info!(
            "Nothing to delete for {} {} {}/{}",
            POSTGRES_RESOURCE_TYPE,
            self.name(),
            postgres.namespace().unwrap_or_default(),
            postgres.name_any()
        );
        Ok(())
    }
}

/// Race `fut` against `cancel`, preferring cancellation
async fn cancellable<T, F>(
    cancel: &CancellationToken,
    operation: &'static str,
    fut: F,
) -> Result<T, ProvisionError>
where
    F: Future<Output = Result<T, ProvisionError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProvisionError::Cancelled { operation }),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::PostgresSpec;
    use crate::store::InMemoryObjectStore;
    use crate::strategy::InMemoryStrategyStore;

    fn provisioner() -> Provisioner<InMemoryObjectStore, InMemoryStrategyStore> {
        Provisioner::new(
            InMemoryObjectStore::new(),
            InMemoryStrategyStore::new().with_strategy("postgres", "production", "{}"),
            PostgresDefaults::default(),
        )
    }

    fn postgres(namespace: Option<&str>) -> Postgres {
        let mut pg = Postgres::new(
            "db1",
            PostgresSpec {
                type_: "openshift".to_string(),
                tier: "production".to_string(),
                secret_ref: None,
            },
        );
        pg.metadata.namespace = namespace.map(str::to_string);
        pg
    }

    #[test]
    fn test_metrics_flag_follows_config() {
        let config = ProvisionerConfig {
            enable_metrics: false,
            ..ProvisionerConfig::default()
        };
        let disabled = provisioner().with_metrics(config.enable_metrics);
        assert!(!disabled.metrics_enabled());
        assert!(provisioner().metrics_enabled());
    }

    #[tokio::test]
    async fn test_disabled_metrics_leave_counters_unchanged() {
        let applied = || {
            metrics::OBJECTS_APPLIED_TOTAL
                .with_label_values(&["PersistentVolumeClaim", "created"])
                .get()
        };
        let pending = || metrics::OUTCOMES_TOTAL.with_label_values(&["pending"]).get();
        let (applied_before, pending_before) = (applied(), pending());

        let provisioner = provisioner().with_metrics(false);
        let result = provisioner
            .reconcile(&postgres(Some("ns1")), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.outcome, ProvisionOutcome::Pending);

        assert_eq!(applied(), applied_before);
        assert_eq!(pending(), pending_before);
    }

    #[tokio::test]
    async fn test_enabled_metrics_count_errors_by_reason() {
        let invalid = || {
            metrics::RECONCILIATION_ERRORS_TOTAL
                .with_label_values(&["invalid_resource"])
                .get()
        };
        let before = invalid();

        let err = provisioner()
            .reconcile(&postgres(None), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidResource(_)));
        assert_eq!(invalid(), before + 1);
    }

    #[test]
    fn test_apply_operations_follow_apply_order() {
        let operations: Vec<&str> = ManagedKind::APPLY_ORDER
            .into_iter()
            .map(apply_operation)
            .collect();
        assert_eq!(
            operations,
            vec![
                "claim apply",
                "credentials apply",
                "deployment apply",
                "service apply"
            ]
        );
    }

    #[tokio::test]
    async fn test_cancellable_passes_through_result() {
        let cancel = CancellationToken::new();
        let value = cancellable(&cancel, "noop", async { Ok::<_, ProvisionError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancellable_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = cancellable(&cancel, "strategy lookup", async {
            Ok::<_, ProvisionError>(7)
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Cancelled {
                operation: "strategy lookup"
            }
        ));
    }

    #[tokio::test]
    async fn test_cancellable_interrupts_pending_future() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move { trigger.cancel() });

        let err = cancellable(&cancel, "readiness check", std::future::pending::<
            Result<(), ProvisionError>,
        >())
        .await
        .unwrap_err();
        assert_eq!(err.reason(), "cancelled");
    }
}
