//! Assignment engine - the service object tying the components together

use crate::assignments::AssignmentStore;
use crate::bucket;
use crate::experiment::{Experiment, ExperimentStatus, VariationAssignment};
use crate::kv::KvStore;
use crate::ledger::{MetricsLedger, ResultGroup, TelemetrySink, DEFAULT_TELEMETRY_QUEUE_CAPACITY};
use crate::persist::{Persistence, DEFAULT_ASSIGNMENTS_KEY, DEFAULT_EXPERIMENTS_KEY};
use crate::registry::ExperimentRegistry;
use crate::stats::{self, Winner};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// What a caller gets back from a successful assignment: the variation id
/// to render and that variation's current config payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedVariation {
    variation_id: String,
    config: Option<serde_json::Value>,
}

impl AssignedVariation {
    fn new(variation_id: impl Into<String>, config: Option<serde_json::Value>) -> Self {
        Self {
            variation_id: variation_id.into(),
            config,
        }
    }

    /// Get the assigned variation's ID.
    #[must_use]
    pub fn variation_id(&self) -> &str {
        &self.variation_id
    }

    /// Get the variation's current config payload, if it has one.
    #[must_use]
    pub const fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }
}

/// The experiment engine.
///
/// An explicit service object: construct one at startup via
/// [`AbEngine::builder`] and share it by reference. Construction loads
/// persisted registry and assignment state once and spawns the telemetry
/// worker; all indexes are concurrent, so the engine is `Send + Sync`.
///
/// # Example
///
/// ```rust,no_run
/// use sorteo::experiment::{Experiment, ExperimentStatus, Variation};
/// use sorteo::{AbEngine, MemoryKvStore, NoopSink};
///
/// # async fn example() -> sorteo::Result<()> {
/// let engine = AbEngine::builder(MemoryKvStore::new(), NoopSink).build().await;
///
/// let experiment = Experiment::builder("exp-cta", "Checkout CTA", "conversion_rate")
///     .variation(Variation::new("control", "Blue button", 50))
///     .variation(Variation::new("treatment", "Green button", 50))
///     .status(ExperimentStatus::Running)
///     .build();
/// engine.create_experiment(experiment).await?;
///
/// if let Some(assigned) = engine.assign("user-42", "exp-cta").await? {
///     engine.log_metric("exp-cta", assigned.variation_id(), "conversion_rate", 1.0);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AbEngine<S: KvStore> {
    registry: ExperimentRegistry<S>,
    assignments: AssignmentStore<S>,
    ledger: MetricsLedger,
}

impl<S: KvStore> AbEngine<S> {
    /// Create a builder over the given store and telemetry sink.
    #[must_use]
    pub fn builder<T: TelemetrySink>(store: S, sink: T) -> AbEngineBuilder<S, T> {
        AbEngineBuilder::new(store, sink)
    }

    /// Store a new experiment (overwrite semantics per id) and persist.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidWeights`] when variation weights do not sum to 100;
    /// storage errors when the save fails.
    pub async fn create_experiment(&self, experiment: Experiment) -> Result<()> {
        self.registry.create(experiment).await
    }

    /// Get an experiment by id.
    #[must_use]
    pub fn get_experiment(&self, experiment_id: &str) -> Option<Experiment> {
        self.registry.get(experiment_id)
    }

    /// List experiments, optionally filtered by status.
    #[must_use]
    pub fn list_experiments(&self, status: Option<ExperimentStatus>) -> Vec<Experiment> {
        self.registry.list(status)
    }

    /// Update an experiment's status; silent no-op for an unknown id.
    ///
    /// # Errors
    ///
    /// Storage errors when the save fails.
    pub async fn update_experiment_status(
        &self,
        experiment_id: &str,
        status: ExperimentStatus,
    ) -> Result<()> {
        self.registry.update_status(experiment_id, status).await
    }

    /// Assign a user to a variation of a running experiment.
    ///
    /// Sticky: a cached assignment is replayed without recomputation, even
    /// if the variation table changed since. A fresh assignment derives a
    /// deterministic bucket from `userId:experimentId`, walks the weighted
    /// slots, persists the record, and returns the chosen variation.
    ///
    /// Returns `Ok(None)` when the experiment is not running or the user is
    /// outside the audience - ineligibility is not an error.
    ///
    /// # Errors
    ///
    /// [`Error::ExperimentNotFound`] for an unknown id; storage errors when
    /// persisting a fresh assignment fails.
    pub async fn assign(
        &self,
        user_id: &str,
        experiment_id: &str,
    ) -> Result<Option<AssignedVariation>> {
        let Some(experiment) = self.registry.get(experiment_id) else {
            return Err(Error::ExperimentNotFound(experiment_id.to_string()));
        };

        if experiment.status() != ExperimentStatus::Running {
            return Ok(None);
        }

        if let Some(existing) = self.assignments.get(user_id, experiment_id) {
            let config = experiment
                .variation(existing.variation_id())
                .and_then(|v| v.config().cloned());
            return Ok(Some(AssignedVariation::new(existing.variation_id(), config)));
        }

        if !experiment.admits(user_id) {
            return Ok(None);
        }

        let bucket = bucket::stable_bucket(user_id, experiment_id);
        let Some(variation) = bucket::pick_variation(experiment.variations(), bucket) else {
            return Ok(None);
        };

        debug!(user_id, experiment_id, bucket, variation_id = variation.id(), "user bucketed");

        let assigned = AssignedVariation::new(variation.id(), variation.config().cloned());
        self.assignments
            .insert(VariationAssignment::new(user_id, experiment_id, variation.id()))
            .await?;

        Ok(Some(assigned))
    }

    /// Get the stored assignment record for a (user, experiment) pair.
    ///
    /// Pure lookup: never computes a bucket, never writes.
    #[must_use]
    pub fn get_user_variation(
        &self,
        user_id: &str,
        experiment_id: &str,
    ) -> Option<VariationAssignment> {
        self.assignments.get(user_id, experiment_id)
    }

    /// Append one metric observation and enqueue it for telemetry.
    pub fn log_metric(
        &self,
        experiment_id: &str,
        variation_id: &str,
        metric_name: &str,
        value: f64,
    ) {
        self.ledger
            .log_metric(experiment_id, variation_id, metric_name, value);
    }

    /// Every result group recorded for the experiment.
    #[must_use]
    pub fn get_results(&self, experiment_id: &str) -> Vec<ResultGroup> {
        self.ledger.get_results(experiment_id)
    }

    /// Pick the variation with the strictly highest primary-metric average.
    ///
    /// Variations iterate in their defined order and ties keep the earlier
    /// one. Returns `Ok(None)` when no primary-metric results exist.
    ///
    /// # Errors
    ///
    /// [`Error::ExperimentNotFound`] for an unknown id.
    pub fn get_winner(&self, experiment_id: &str) -> Result<Option<Winner>> {
        let Some(experiment) = self.registry.get(experiment_id) else {
            return Err(Error::ExperimentNotFound(experiment_id.to_string()));
        };

        let groups = self.ledger.get_results(experiment_id);
        let mut winner: Option<Winner> = None;

        for variation in experiment.variations() {
            let values: Vec<f64> = groups
                .iter()
                .filter(|g| {
                    g.variation_id() == variation.id()
                        && g.metric_name() == experiment.primary_metric()
                })
                .flat_map(ResultGroup::values)
                .collect();

            if values.is_empty() {
                continue;
            }

            let mean = stats::mean(&values);
            if winner.as_ref().map_or(true, |w| mean > w.mean()) {
                winner = Some(Winner::new(variation.id(), variation.name(), mean));
            }
        }

        Ok(winner)
    }
}

/// Builder for [`AbEngine`].
///
/// Storage keys and the telemetry queue bound are configurable; everything
/// else is injected through the store and sink.
pub struct AbEngineBuilder<S, T> {
    store: S,
    sink: T,
    experiments_key: String,
    assignments_key: String,
    telemetry_queue_capacity: usize,
}

impl<S: KvStore, T: TelemetrySink> AbEngineBuilder<S, T> {
    /// Create a builder with default keys and queue capacity.
    #[must_use]
    pub fn new(store: S, sink: T) -> Self {
        Self {
            store,
            sink,
            experiments_key: DEFAULT_EXPERIMENTS_KEY.to_string(),
            assignments_key: DEFAULT_ASSIGNMENTS_KEY.to_string(),
            telemetry_queue_capacity: DEFAULT_TELEMETRY_QUEUE_CAPACITY,
        }
    }

    /// Override the key holding the serialized experiment list.
    #[must_use]
    pub fn experiments_key(mut self, key: impl Into<String>) -> Self {
        self.experiments_key = key.into();
        self
    }

    /// Override the key holding the serialized assignment map.
    #[must_use]
    pub fn assignments_key(mut self, key: impl Into<String>) -> Self {
        self.assignments_key = key.into();
        self
    }

    /// Override the telemetry queue bound.
    #[must_use]
    pub const fn telemetry_queue_capacity(mut self, capacity: usize) -> Self {
        self.telemetry_queue_capacity = capacity;
        self
    }

    /// Load persisted state and construct the engine.
    ///
    /// Never fails: missing or corrupt stored state degrades to empty with
    /// a WARN. Must be called inside a Tokio runtime (the telemetry worker
    /// spawns here).
    pub async fn build(self) -> AbEngine<S> {
        let persistence = Persistence::new(
            Arc::new(self.store),
            self.experiments_key,
            self.assignments_key,
        );

        let registry = ExperimentRegistry::load(persistence.clone()).await;
        let assignments = AssignmentStore::load(persistence).await;
        let ledger = MetricsLedger::new(Arc::new(self.sink), self.telemetry_queue_capacity);

        AbEngine {
            registry,
            assignments,
            ledger,
        }
    }
}
