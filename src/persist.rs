//! Persistence adapter - durable snapshots of registry and assignment state
//!
//! Two keys in the backing [`KvStore`]: one holding a JSON array of
//! experiments, one holding a JSON map from user id to that user's
//! assignment records. State loads once at engine construction and saves on
//! every registry or assignment-store mutation.
//!
//! Missing, unreadable, or malformed values degrade to empty state with a
//! WARN - a corrupt snapshot must never keep the engine from starting.

use crate::experiment::{Experiment, VariationAssignment};
use crate::kv::KvStore;
use crate::Result;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;

/// Default key holding the serialized experiment list.
pub const DEFAULT_EXPERIMENTS_KEY: &str = "sorteo_experiments";

/// Default key holding the serialized per-user assignment map.
pub const DEFAULT_ASSIGNMENTS_KEY: &str = "sorteo_assignments";

/// Per-user assignment table as it is serialized.
pub type AssignmentMap = FxHashMap<String, Vec<VariationAssignment>>;

/// Adapter between in-memory indexes and the durable [`KvStore`].
pub struct Persistence<S: KvStore> {
    store: Arc<S>,
    experiments_key: String,
    assignments_key: String,
}

impl<S: KvStore> Clone for Persistence<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            experiments_key: self.experiments_key.clone(),
            assignments_key: self.assignments_key.clone(),
        }
    }
}

impl<S: KvStore> Persistence<S> {
    /// Create an adapter over the given store and keys.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        experiments_key: impl Into<String>,
        assignments_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            experiments_key: experiments_key.into(),
            assignments_key: assignments_key.into(),
        }
    }

    /// Load the stored experiment list; empty on absence or corruption.
    pub async fn load_experiments(&self) -> Vec<Experiment> {
        self.load_json(&self.experiments_key, "experiment").await
    }

    /// Persist the full experiment list.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backing store rejects the
    /// write.
    pub async fn save_experiments(&self, experiments: &[Experiment]) -> Result<()> {
        let bytes = serde_json::to_vec(experiments)?;
        self.store.set(&self.experiments_key, bytes).await
    }

    /// Load the stored per-user assignment map; empty on absence or
    /// corruption.
    pub async fn load_assignments(&self) -> AssignmentMap {
        self.load_json(&self.assignments_key, "assignment").await
    }

    /// Persist the full per-user assignment map.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the backing store rejects the
    /// write.
    pub async fn save_assignments(&self, assignments: &AssignmentMap) -> Result<()> {
        let bytes = serde_json::to_vec(assignments)?;
        self.store.set(&self.assignments_key, bytes).await
    }

    async fn load_json<T>(&self, key: &str, what: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(error) => {
                    warn!(key, %error, "stored {} state is malformed; starting empty", what);
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(error) => {
                warn!(key, %error, "could not load {} state; starting empty", what);
                T::default()
            }
        }
    }
}
