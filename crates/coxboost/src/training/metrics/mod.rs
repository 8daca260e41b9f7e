//! Evaluation metrics for survival models.
//!
//! Metrics are separate from objectives: a model trained on the Cox loss can
//! be monitored with any of them.
//!
//! # Available Metrics
//!
//! - [`PartialLikelihood`]: Twice the mean Cox log partial likelihood
//! - [`ConcordanceIndex`]: Harrell's C for right-censored data
//!
//! The pair-counting routine behind [`ConcordanceIndex`] is exposed as
//! [`concordance_index_censored`] for callers that have explicit
//! event/time columns.

mod concordance;
mod survival;

pub use concordance::{ConcordanceSummary, DEFAULT_TIED_TOL, concordance_index_censored};
pub use survival::{ConcordanceIndex, PartialLikelihood};

use std::sync::Arc;

use ndarray::ArrayView1;

use super::eval::MetricValue;
use crate::data::LabelSource;
use crate::error::Result;

// =============================================================================
// Custom Metric
// =============================================================================

/// Type alias for the custom metric compute function.
///
/// Takes raw scores and sign-encoded labels, returns a scalar.
pub type CustomMetricFn =
    Box<dyn Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> Result<f64> + Send + Sync + 'static>;

/// A user-provided metric defined by a closure.
///
/// # Example
///
/// ```
/// use coxboost::training::CustomMetric;
/// use coxboost::{Metric, MetricFn};
/// use ndarray::array;
///
/// let event_rate = CustomMetric::new(
///     "event_rate",
///     |_scores, labels| Ok(labels.iter().filter(|&&y| y > 0.0).count() as f64 / labels.len() as f64),
///     true,
/// );
/// let metric = Metric::custom(event_rate);
/// let v = metric.compute(array![0.0, 0.0].view(), &array![1.0, -2.0]).unwrap();
/// assert_eq!(v, 0.5);
/// ```
pub struct CustomMetric {
    /// Name of the metric (for logging).
    pub name: &'static str,
    compute_fn: CustomMetricFn,
    /// Whether higher values indicate better performance.
    pub higher_is_better: bool,
}

impl CustomMetric {
    pub fn new(
        name: &'static str,
        compute_fn: impl Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> Result<f64>
        + Send
        + Sync
        + 'static,
        higher_is_better: bool,
    ) -> Self {
        Self {
            name,
            compute_fn: Box::new(compute_fn),
            higher_is_better,
        }
    }

    pub fn compute(&self, predictions: ArrayView1<'_, f64>, labels: &dyn LabelSource) -> Result<f64> {
        (self.compute_fn)(predictions, labels.labels())
    }
}

impl std::fmt::Debug for CustomMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomMetric")
            .field("name", &self.name)
            .field("higher_is_better", &self.higher_is_better)
            .finish()
    }
}

// =============================================================================
// Metric Enum (Convenience wrapper)
// =============================================================================

/// A dynamically-dispatched metric.
///
/// # Example
///
/// ```
/// use coxboost::Metric;
///
/// let pl = Metric::partial_likelihood();
/// let ci = Metric::concordance();
/// let none = Metric::none();
/// ```
#[derive(Debug, Clone)]
pub enum Metric {
    /// No metric - skips evaluation entirely.
    None,
    /// Twice the mean Cox log partial likelihood.
    PartialLikelihood(PartialLikelihood),
    /// Harrell's concordance index.
    Concordance(ConcordanceIndex),
    /// Custom user-provided metric.
    Custom(Arc<CustomMetric>),
}

impl Default for Metric {
    fn default() -> Self {
        Self::PartialLikelihood(PartialLikelihood)
    }
}

impl Metric {
    pub fn none() -> Self {
        Self::None
    }

    pub fn partial_likelihood() -> Self {
        Self::PartialLikelihood(PartialLikelihood)
    }

    /// Concordance index with the default tie tolerance.
    pub fn concordance() -> Self {
        Self::Concordance(ConcordanceIndex::default())
    }

    pub fn custom(metric: CustomMetric) -> Self {
        Self::Custom(Arc::new(metric))
    }
}

impl MetricFn for Metric {
    fn compute(&self, predictions: ArrayView1<'_, f64>, labels: &dyn LabelSource) -> Result<f64> {
        match self {
            Self::None => Ok(f64::NAN),
            Self::PartialLikelihood(inner) => inner.compute(predictions, labels),
            Self::Concordance(inner) => inner.compute(predictions, labels),
            Self::Custom(inner) => inner.compute(predictions, labels),
        }
    }

    fn higher_is_better(&self) -> bool {
        match self {
            Self::None => false,
            Self::PartialLikelihood(inner) => inner.higher_is_better(),
            Self::Concordance(inner) => inner.higher_is_better(),
            Self::Custom(inner) => inner.higher_is_better,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::None => "<none>",
            Self::PartialLikelihood(inner) => inner.name(),
            Self::Concordance(inner) => inner.name(),
            Self::Custom(inner) => inner.name,
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

// =============================================================================
// Metric Trait
// =============================================================================

/// A metric for evaluating model quality.
///
/// Unlike objectives, metrics produce one scalar per dataset. The triple
/// returned by [`MetricFn::evaluate`] is what boosting runtimes expect from
/// an evaluation callback: `(name, value, higher_is_better)`.
pub trait MetricFn: Send + Sync {
    /// Compute the metric value.
    fn compute(&self, predictions: ArrayView1<'_, f64>, labels: &dyn LabelSource) -> Result<f64>;

    /// Whether higher values indicate better performance.
    fn higher_is_better(&self) -> bool;

    /// Name of the metric (for logging).
    fn name(&self) -> &'static str;

    /// Whether this metric is enabled. Only [`Metric::None`] returns `false`.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Compute and wrap as a named [`MetricValue`].
    fn evaluate(&self, predictions: ArrayView1<'_, f64>, labels: &dyn LabelSource) -> Result<MetricValue> {
        let value = self.compute(predictions, labels)?;
        Ok(MetricValue::new(self.name(), value, self.higher_is_better()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurvivalError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn enum_dispatch_matches_direct() {
        let scores = array![0.3, -0.1, 0.8, 0.0];
        let labels = array![2.0, -3.0, 1.0, 4.0];

        let direct = PartialLikelihood.compute(scores.view(), &labels).unwrap();
        let wrapped = Metric::partial_likelihood().compute(scores.view(), &labels).unwrap();
        assert_eq!(direct, wrapped);

        let direct = ConcordanceIndex::default().compute(scores.view(), &labels).unwrap();
        let wrapped = Metric::concordance().compute(scores.view(), &labels).unwrap();
        assert_eq!(direct, wrapped);
    }

    #[test]
    fn evaluate_returns_named_triple() {
        let v = Metric::concordance()
            .evaluate(array![3.0, 2.0, 1.0].view(), &array![1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(v.name, "concordance_index");
        assert_abs_diff_eq!(v.value, 1.0, epsilon = 1e-12);
        assert!(v.higher_is_better);
    }

    #[test]
    fn custom_metric_errors_propagate() {
        let metric = Metric::custom(CustomMetric::new(
            "always_fails",
            |_, _| Err(SurvivalError::NoComparablePairs),
            false,
        ));
        let err = metric.compute(array![0.0].view(), &array![1.0]).unwrap_err();
        assert_eq!(err, SurvivalError::NoComparablePairs);
        assert_eq!(metric.name(), "always_fails");
        assert!(!metric.higher_is_better());
    }

    #[test]
    fn metric_none_disabled() {
        let metric = Metric::none();
        assert!(!metric.is_enabled());
        assert_eq!(metric.name(), "<none>");
        assert!(metric.compute(array![0.0].view(), &array![1.0]).unwrap().is_nan());
        assert!(Metric::default().is_enabled());
    }
}
