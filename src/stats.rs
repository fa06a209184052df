//! Significance estimation
//!
//! A two-sample t statistic over population variances with a table-based
//! p-value lookup. This is deliberately an approximation: the table maps
//! |t| to the familiar two-tailed critical values of the normal
//! distribution instead of consulting the exact t distribution. Good enough
//! to rank variations and gate a rollout; not a substitute for rigorous
//! inference.

use serde::Serialize;

/// Outcome of comparing a treatment sample against a control sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Significance {
    p_value: f64,
    is_significant: bool,
    confidence: f64,
}

impl Significance {
    const NO_EVIDENCE: Self = Self {
        p_value: 1.0,
        is_significant: false,
        confidence: 0.0,
    };

    /// Approximate two-tailed p-value.
    #[must_use]
    pub const fn p_value(&self) -> f64 {
        self.p_value
    }

    /// Whether the p-value clears the 0.05 threshold.
    #[must_use]
    pub const fn is_significant(&self) -> bool {
        self.is_significant
    }

    /// Confidence percentage, `(1 - p) * 100`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// The winning variation of an experiment, by primary-metric average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    variation_id: String,
    variation_name: String,
    mean: f64,
}

impl Winner {
    pub(crate) fn new(
        variation_id: impl Into<String>,
        variation_name: impl Into<String>,
        mean: f64,
    ) -> Self {
        Self {
            variation_id: variation_id.into(),
            variation_name: variation_name.into(),
            mean,
        }
    }

    /// Get the winning variation's ID.
    #[must_use]
    pub fn variation_id(&self) -> &str {
        &self.variation_id
    }

    /// Get the winning variation's name.
    #[must_use]
    pub fn variation_name(&self) -> &str {
        &self.variation_name
    }

    /// Get the primary-metric average that won.
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }
}

/// Compare two result samples and estimate whether treatment beats control.
///
/// Either sample empty returns the defined edge case
/// `{ p_value: 1.0, is_significant: false, confidence: 0.0 }` - no division
/// by zero. Variances are population variances (divisor `n`, not `n - 1`);
/// the pooled standard error is `sqrt(var_c/n_c + var_t/n_t)`. Two constant
/// equal samples produce a NaN statistic, which falls through the lookup
/// table to p = 1.0.
#[must_use]
pub fn calculate_significance(control: &[f64], treatment: &[f64]) -> Significance {
    if control.is_empty() || treatment.is_empty() {
        return Significance::NO_EVIDENCE;
    }

    let mean_control = mean(control);
    let mean_treatment = mean(treatment);

    let var_control = population_variance(control, mean_control);
    let var_treatment = population_variance(treatment, mean_treatment);

    #[allow(clippy::cast_precision_loss)]
    let pooled_std_err =
        (var_control / control.len() as f64 + var_treatment / treatment.len() as f64).sqrt();
    let t_statistic = (mean_treatment - mean_control) / pooled_std_err;

    let p_value = approximate_p_value(t_statistic.abs());

    Significance {
        p_value,
        is_significant: p_value < 0.05,
        confidence: (1.0 - p_value) * 100.0,
    }
}

/// Arithmetic mean. Callers guarantee a non-empty sample.
#[must_use]
pub fn mean(sample: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = sample.len() as f64;
    sample.iter().sum::<f64>() / n
}

/// Population variance (divisor `n`, not `n - 1`).
#[must_use]
pub fn population_variance(sample: &[f64], sample_mean: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = sample.len() as f64;
    sample
        .iter()
        .map(|x| (x - sample_mean).powi(2))
        .sum::<f64>()
        / n
}

/// Two-tailed p-value lookup against normal-distribution critical values.
///
/// A NaN input fails every comparison and lands on 1.0.
fn approximate_p_value(t_abs: f64) -> f64 {
    if t_abs > 3.0 {
        0.001
    } else if t_abs > 2.576 {
        0.01
    } else if t_abs > 1.96 {
        0.05
    } else if t_abs > 1.645 {
        0.1
    } else {
        1.0
    }
}
