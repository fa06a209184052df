//! Error types for sorteo
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Sorteo error types
#[derive(Error, Debug)]
pub enum Error {
    /// Variation weights on a new experiment do not sum to 100
    #[error("variation weights must sum to exactly 100, got {sum}\nFix the experiment payload and retry")]
    InvalidWeights {
        /// The rejected weight total
        sum: u32,
    },

    /// Operation referenced an experiment id the registry does not hold
    #[error("experiment not found: {0}")]
    ExperimentNotFound(String),

    /// Durable store rejected a load or save
    #[error("storage error: {0}")]
    Storage(String),

    /// Record encoding/decoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Telemetry sink rejected a delivery (logged by the queue worker, never surfaced)
    #[error("telemetry error: {0}")]
    Telemetry(String),
}
