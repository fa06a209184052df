//! # Sorteo: Deterministic A/B Experiment Assignment Engine
//!
//! Sorteo buckets users into weighted experiment variations with a stable
//! hash, keeps those assignments sticky across config edits, records metric
//! observations per variation, and estimates which variation wins.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: invalid weight tables are rejected at creation,
//!   never at assignment time
//! - **Jidoka**: determinism is testable (cache replay == hash re-derivation)
//! - **Muda elimination**: telemetry is a bounded queue, never a blocking
//!   call on the assignment path
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sorteo::experiment::{Experiment, ExperimentStatus, Variation};
//! use sorteo::{AbEngine, MemoryKvStore, NoopSink};
//!
//! # async fn example() -> sorteo::Result<()> {
//! let engine = AbEngine::builder(MemoryKvStore::new(), NoopSink).build().await;
//!
//! engine
//!     .create_experiment(
//!         Experiment::builder("exp-cta", "Checkout CTA", "conversion_rate")
//!             .variation(Variation::new("control", "Blue button", 50))
//!             .variation(Variation::new("treatment", "Green button", 50))
//!             .status(ExperimentStatus::Running)
//!             .build(),
//!     )
//!     .await?;
//!
//! let assigned = engine.assign("user-42", "exp-cta").await?;
//! # let _ = assigned;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod assignments;
pub mod bucket;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod kv;
pub mod ledger;
pub mod persist;
pub mod registry;
pub mod stats;

pub use engine::{AbEngine, AbEngineBuilder, AssignedVariation};
pub use error::{Error, Result};
pub use kv::{KvStore, MemoryKvStore};
pub use ledger::{NoopSink, ResultGroup, TelemetrySink};
pub use stats::{calculate_significance, Significance, Winner};

#[cfg(feature = "http")]
pub use ledger::HttpSink;
