//! Variation assignment - the sticky record binding a user to a bucket

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's assignment to one variation of one experiment.
///
/// Created once per (user, experiment) pair and never mutated afterwards:
/// the record is what makes assignment *sticky*. Editing the experiment's
/// variation table later does not move users who already hold a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariationAssignment {
    user_id: String,
    experiment_id: String,
    variation_id: String,
    assigned_at: DateTime<Utc>,
    exposure_logged: bool,
}

impl VariationAssignment {
    /// Create a new assignment record stamped with the current time.
    ///
    /// `exposure_logged` starts false; the presentation layer flips its own
    /// copy when it fires the exposure event, the stored record stays as
    /// written.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        experiment_id: impl Into<String>,
        variation_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            experiment_id: experiment_id.into(),
            variation_id: variation_id.into(),
            assigned_at: Utc::now(),
            exposure_logged: false,
        }
    }

    /// Get the user ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the assigned variation ID.
    #[must_use]
    pub fn variation_id(&self) -> &str {
        &self.variation_id
    }

    /// Get the assignment timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    /// Whether an exposure event has been recorded for this assignment.
    #[must_use]
    pub const fn exposure_logged(&self) -> bool {
        self.exposure_logged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_new() {
        let assignment = VariationAssignment::new("u1", "exp-1", "control");
        assert_eq!(assignment.user_id(), "u1");
        assert_eq!(assignment.experiment_id(), "exp-1");
        assert_eq!(assignment.variation_id(), "control");
        assert!(!assignment.exposure_logged());
        assert!(assignment.assigned_at().timestamp() > 0);
    }

    #[test]
    fn test_assignment_serialization() {
        let assignment = VariationAssignment::new("u1", "exp-1", "control");

        let json = serde_json::to_string(&assignment).expect("serialization failed");
        let back: VariationAssignment =
            serde_json::from_str(&json).expect("deserialization failed");

        assert_eq!(assignment, back);
    }
}
