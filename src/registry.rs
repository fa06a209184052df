//! Experiment registry - validated storage of experiment definitions

use crate::experiment::{Experiment, ExperimentStatus};
use crate::kv::KvStore;
use crate::persist::Persistence;
use crate::{Error, Result};
use dashmap::DashMap;
use tracing::debug;

/// Stores and validates experiment definitions.
///
/// The registry owns experiment lifetime: definitions live in a concurrent
/// in-memory index and every mutation writes the full list back through the
/// persistence adapter. Weight validation happens exactly once, at
/// creation - stored experiments are trusted afterwards.
pub struct ExperimentRegistry<S: KvStore> {
    experiments: DashMap<String, Experiment>,
    persistence: Persistence<S>,
}

impl<S: KvStore> ExperimentRegistry<S> {
    /// Build a registry over the adapter, loading any persisted state.
    pub(crate) async fn load(persistence: Persistence<S>) -> Self {
        let experiments = DashMap::new();
        for experiment in persistence.load_experiments().await {
            experiments.insert(experiment.id().to_string(), experiment);
        }
        Self {
            experiments,
            persistence,
        }
    }

    /// Store a new experiment (overwriting any existing one with the same
    /// id) and persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWeights`] when the variation weights do not
    /// sum to exactly 100, or a storage error if the save fails.
    pub async fn create(&self, experiment: Experiment) -> Result<()> {
        let sum = experiment.total_weight();
        if sum != 100 {
            return Err(Error::InvalidWeights { sum });
        }

        debug!(experiment_id = experiment.id(), "experiment created");
        self.experiments
            .insert(experiment.id().to_string(), experiment);
        self.save().await
    }

    /// Get an experiment by id.
    #[must_use]
    pub fn get(&self, experiment_id: &str) -> Option<Experiment> {
        self.experiments.get(experiment_id).map(|e| e.clone())
    }

    /// List experiments, optionally filtered by status. Order is not
    /// guaranteed.
    #[must_use]
    pub fn list(&self, status: Option<ExperimentStatus>) -> Vec<Experiment> {
        self.experiments
            .iter()
            .filter(|e| status.map_or(true, |s| e.status() == s))
            .map(|e| e.value().clone())
            .collect()
    }

    /// Update an experiment's status in place and persist.
    ///
    /// Silent no-op for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the save fails.
    pub async fn update_status(&self, experiment_id: &str, status: ExperimentStatus) -> Result<()> {
        {
            let Some(mut experiment) = self.experiments.get_mut(experiment_id) else {
                return Ok(());
            };
            experiment.set_status(status);
        }
        debug!(experiment_id, ?status, "experiment status updated");
        self.save().await
    }

    /// Number of stored experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Whether the registry holds no experiments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    async fn save(&self) -> Result<()> {
        let all: Vec<Experiment> = self.experiments.iter().map(|e| e.value().clone()).collect();
        self.persistence.save_experiments(&all).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Variation;
    use crate::kv::MemoryKvStore;
    use crate::persist::{DEFAULT_ASSIGNMENTS_KEY, DEFAULT_EXPERIMENTS_KEY};
    use std::sync::Arc;

    async fn registry() -> ExperimentRegistry<MemoryKvStore> {
        let persistence = Persistence::new(
            Arc::new(MemoryKvStore::new()),
            DEFAULT_EXPERIMENTS_KEY,
            DEFAULT_ASSIGNMENTS_KEY,
        );
        ExperimentRegistry::load(persistence).await
    }

    fn experiment(id: &str, weights: &[u32]) -> Experiment {
        let mut builder = Experiment::builder(id, format!("Experiment {id}"), "conversion");
        for (i, w) in weights.iter().enumerate() {
            builder = builder.variation(Variation::new(format!("v{i}"), format!("V{i}"), *w));
        }
        builder.build()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = registry().await;
        registry.create(experiment("exp-1", &[60, 40])).await.unwrap();

        let stored = registry.get("exp-1").unwrap();
        assert_eq!(stored.total_weight(), 100);
        assert!(registry.get("exp-2").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_weight_sum() {
        let registry = registry().await;

        let result = registry.create(experiment("exp-1", &[40, 40, 10])).await;
        assert!(matches!(result, Err(Error::InvalidWeights { sum: 90 })));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_create_overwrites_same_id() {
        let registry = registry().await;
        registry.create(experiment("exp-1", &[50, 50])).await.unwrap();
        registry.create(experiment("exp-1", &[100])).await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("exp-1").unwrap().variations().len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let registry = registry().await;
        registry.create(experiment("exp-1", &[100])).await.unwrap();
        registry.create(experiment("exp-2", &[100])).await.unwrap();
        registry
            .update_status("exp-2", ExperimentStatus::Running)
            .await
            .unwrap();

        assert_eq!(registry.list(None).len(), 2);
        assert_eq!(registry.list(Some(ExperimentStatus::Running)).len(), 1);
        assert_eq!(registry.list(Some(ExperimentStatus::Archived)).len(), 0);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_noop() {
        let registry = registry().await;
        registry
            .update_status("ghost", ExperimentStatus::Running)
            .await
            .unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let store = Arc::new(MemoryKvStore::new());
        let persistence = Persistence::new(
            Arc::clone(&store),
            DEFAULT_EXPERIMENTS_KEY,
            DEFAULT_ASSIGNMENTS_KEY,
        );

        let registry = ExperimentRegistry::load(persistence.clone()).await;
        registry.create(experiment("exp-1", &[50, 50])).await.unwrap();
        registry
            .update_status("exp-1", ExperimentStatus::Paused)
            .await
            .unwrap();
        drop(registry);

        let reloaded = ExperimentRegistry::load(persistence).await;
        assert_eq!(
            reloaded.get("exp-1").unwrap().status(),
            ExperimentStatus::Paused
        );
    }
}
