//! Experiment definition - root entity of the assignment engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an experiment.
///
/// Only `Running` experiments hand out assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// Defined but not yet serving traffic.
    Draft,
    /// Actively assigning users and collecting metrics.
    Running,
    /// Temporarily not assigning; existing assignments stay sticky.
    Paused,
    /// Finished collecting; results remain queryable.
    Completed,
    /// Retired.
    Archived,
}

/// A single weighted arm of an experiment.
///
/// Weights are percentages in `0..=100`; the registry enforces that the
/// weights of an experiment's variations sum to exactly 100 at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    id: String,
    name: String,
    weight: u32,
    config: Option<serde_json::Value>,
}

impl Variation {
    /// Create a variation with no config payload.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, weight: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            config: None,
        }
    }

    /// Attach an opaque config payload handed back verbatim on assignment.
    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Get the variation ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the variation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the traffic weight (percentage).
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Get the config payload, if any.
    #[must_use]
    pub const fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }
}

/// Audience filter for an experiment.
///
/// A present allow-list admits exactly the listed users; an absent one
/// admits everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Audience {
    user_ids: Option<Vec<String>>,
}

impl Audience {
    /// Audience admitting every user.
    #[must_use]
    pub const fn everyone() -> Self {
        Self { user_ids: None }
    }

    /// Audience admitting only the listed user ids.
    #[must_use]
    pub fn allow_users<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: Some(user_ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether this audience admits the given user.
    #[must_use]
    pub fn admits(&self, user_id: &str) -> bool {
        self.user_ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| id == user_id))
    }

    /// Get the explicit allow-list, if one is set.
    #[must_use]
    pub fn user_ids(&self) -> Option<&[String]> {
        self.user_ids.as_deref()
    }
}

/// Experiment definition.
///
/// The root entity owned by the registry. Variations are ordered; their
/// order is load-bearing for bucketing (cumulative weight boundaries) and
/// for winner tie-breaks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    id: String,
    name: String,
    status: ExperimentStatus,
    hypothesis: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    variations: Vec<Variation>,
    audience: Option<Audience>,
    primary_metric: String,
    secondary_metrics: Option<Vec<String>>,
}

impl Experiment {
    /// Create a builder for constructing an experiment.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for the experiment
    /// * `name` - Human-readable name
    /// * `primary_metric` - The single metric that decides the winner
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        primary_metric: impl Into<String>,
    ) -> ExperimentBuilder {
        ExperimentBuilder::new(id, name, primary_metric)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Set the lifecycle status.
    pub fn set_status(&mut self, status: ExperimentStatus) {
        self.status = status;
    }

    /// Get the hypothesis under test.
    #[must_use]
    pub fn hypothesis(&self) -> &str {
        &self.hypothesis
    }

    /// Get the start date.
    #[must_use]
    pub const fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Get the end date, if set.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Get the ordered variation table.
    #[must_use]
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// Look up a variation by id.
    #[must_use]
    pub fn variation(&self, variation_id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id() == variation_id)
    }

    /// Sum of all variation weights.
    #[must_use]
    pub fn total_weight(&self) -> u32 {
        self.variations.iter().map(Variation::weight).sum()
    }

    /// Get the audience filter, if any.
    #[must_use]
    pub const fn audience(&self) -> Option<&Audience> {
        self.audience.as_ref()
    }

    /// Whether the audience (if any) admits the given user.
    #[must_use]
    pub fn admits(&self, user_id: &str) -> bool {
        self.audience.as_ref().map_or(true, |a| a.admits(user_id))
    }

    /// Get the primary metric name.
    #[must_use]
    pub fn primary_metric(&self) -> &str {
        &self.primary_metric
    }

    /// Get the secondary metric names, if any.
    #[must_use]
    pub fn secondary_metrics(&self) -> Option<&[String]> {
        self.secondary_metrics.as_deref()
    }
}

/// Builder for `Experiment`.
///
/// `status` defaults to `Draft` and `start_date` to the current time when
/// unset.
#[derive(Debug)]
pub struct ExperimentBuilder {
    id: String,
    name: String,
    status: ExperimentStatus,
    hypothesis: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    variations: Vec<Variation>,
    audience: Option<Audience>,
    primary_metric: String,
    secondary_metrics: Option<Vec<String>>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        primary_metric: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ExperimentStatus::Draft,
            hypothesis: String::new(),
            start_date: None,
            end_date: None,
            variations: Vec::new(),
            audience: None,
            primary_metric: primary_metric.into(),
            secondary_metrics: None,
        }
    }

    /// Set the initial lifecycle status.
    #[must_use]
    pub const fn status(mut self, status: ExperimentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the hypothesis under test.
    #[must_use]
    pub fn hypothesis(mut self, hypothesis: impl Into<String>) -> Self {
        self.hypothesis = hypothesis.into();
        self
    }

    /// Set an explicit start date (defaults to now).
    #[must_use]
    pub const fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Set an end date.
    #[must_use]
    pub const fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Append a variation; order is preserved.
    #[must_use]
    pub fn variation(mut self, variation: Variation) -> Self {
        self.variations.push(variation);
        self
    }

    /// Replace the full variation table.
    #[must_use]
    pub fn variations(mut self, variations: Vec<Variation>) -> Self {
        self.variations = variations;
        self
    }

    /// Restrict the audience.
    #[must_use]
    pub fn audience(mut self, audience: Audience) -> Self {
        self.audience = Some(audience);
        self
    }

    /// Set secondary metric names.
    #[must_use]
    pub fn secondary_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_metrics = Some(metrics.into_iter().map(Into::into).collect());
        self
    }

    /// Build the `Experiment`.
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            id: self.id,
            name: self.name,
            status: self.status,
            hypothesis: self.hypothesis,
            start_date: self.start_date.unwrap_or_else(Utc::now),
            end_date: self.end_date,
            variations: self.variations,
            audience: self.audience,
            primary_metric: self.primary_metric,
            secondary_metrics: self.secondary_metrics,
        }
    }
}
