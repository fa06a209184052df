//! Result record - one metric observation against one variation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single metric observation.
///
/// Append-only: records are never updated or deleted once logged. The
/// camelCase serialization is the telemetry wire shape - one record is
/// POSTed per observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    experiment_id: String,
    variation_id: String,
    metric_name: String,
    value: f64,
    recorded_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Create a new result record stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        variation_id: impl Into<String>,
        metric_name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            variation_id: variation_id.into(),
            metric_name: metric_name.into(),
            value,
            recorded_at: Utc::now(),
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variation ID.
    #[must_use]
    pub fn variation_id(&self) -> &str {
        &self.variation_id
    }

    /// Get the metric name.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Get the observed value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the observation timestamp.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
