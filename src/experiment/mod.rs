//! Experiment data model
//!
//! The records that flow through the engine:
//!
//! ```text
//! Experiment (1) ──< Variation (N, ordered, weights sum to 100)
//!      │
//!      ├──< VariationAssignment (N) [sticky, one per user]
//!      └──< ResultRecord (N) [append-only]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sorteo::experiment::{Experiment, ExperimentStatus, Variation};
//!
//! let experiment = Experiment::builder("exp-001", "Checkout CTA", "conversion_rate")
//!     .hypothesis("A green button converts better")
//!     .variation(Variation::new("control", "Blue button", 50))
//!     .variation(Variation::new("treatment", "Green button", 50))
//!     .status(ExperimentStatus::Running)
//!     .build();
//!
//! assert_eq!(experiment.total_weight(), 100);
//! ```

mod assignment;
mod definition;
mod result_record;

pub use assignment::VariationAssignment;
pub use definition::{Audience, Experiment, ExperimentBuilder, ExperimentStatus, Variation};
pub use result_record::ResultRecord;
