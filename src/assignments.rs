//! Assignment store - the authoritative memo of buckets already handed out

use crate::experiment::VariationAssignment;
use crate::kv::KvStore;
use crate::persist::{AssignmentMap, Persistence};
use crate::Result;
use dashmap::DashMap;

/// Sticky-assignment store.
///
/// In-memory index keyed `userId:experimentId` for O(1) cache lookups,
/// persisted as a per-user map so a reload sees every assignment ever made.
/// Records are write-once: the engine consults the index before computing a
/// bucket, and an index hit always wins over recomputation.
pub struct AssignmentStore<S: KvStore> {
    index: DashMap<String, VariationAssignment>,
    persistence: Persistence<S>,
}

fn index_key(user_id: &str, experiment_id: &str) -> String {
    format!("{user_id}:{experiment_id}")
}

impl<S: KvStore> AssignmentStore<S> {
    /// Build a store over the adapter, loading any persisted assignments.
    pub(crate) async fn load(persistence: Persistence<S>) -> Self {
        let index = DashMap::new();
        for (_, records) in persistence.load_assignments().await {
            for assignment in records {
                index.insert(
                    index_key(assignment.user_id(), assignment.experiment_id()),
                    assignment,
                );
            }
        }
        Self { index, persistence }
    }

    /// Get the stored assignment for a (user, experiment) pair.
    #[must_use]
    pub fn get(&self, user_id: &str, experiment_id: &str) -> Option<VariationAssignment> {
        self.index
            .get(&index_key(user_id, experiment_id))
            .map(|a| a.clone())
    }

    /// Record a fresh assignment and persist the full table.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the save fails; the in-memory index keeps
    /// the record either way, so replay within this process stays sticky.
    pub(crate) async fn insert(&self, assignment: VariationAssignment) -> Result<()> {
        self.index.insert(
            index_key(assignment.user_id(), assignment.experiment_id()),
            assignment,
        );
        self.save().await
    }

    /// Number of stored assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no assignments have been made.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    async fn save(&self) -> Result<()> {
        let mut by_user = AssignmentMap::default();
        for entry in self.index.iter() {
            by_user
                .entry(entry.user_id().to_string())
                .or_default()
                .push(entry.value().clone());
        }
        self.persistence.save_assignments(&by_user).await
    }
}
