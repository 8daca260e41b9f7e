//! Survival metrics.
//!
//! Both metrics take raw risk scores (higher = earlier expected failure) and
//! sign-encoded labels, and report "higher is better".

use bon::Builder;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::MetricFn;
use super::concordance::{ConcordanceSummary, DEFAULT_TIED_TOL, concordance_index_censored};
use crate::data::{LabelSource, split_labels};
use crate::error::{ConfigError, Result};
use crate::training::RiskSet;
use crate::utils::Parallelism;

// =============================================================================
// Partial likelihood
// =============================================================================

/// Twice the mean per-sample Cox log partial likelihood.
///
/// `2 / N · Σ_i e_i (s_i − log R_i)` with samples sorted by time and `R_i`
/// the risk-set sum at sorted position `i`. Censored samples contribute
/// zero terms but still count in `N`, so an all-censored set scores 0.
/// Empty input yields NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialLikelihood;

impl MetricFn for PartialLikelihood {
    fn compute(&self, predictions: ArrayView1<'_, f64>, labels: &dyn LabelSource) -> Result<f64> {
        let rs = RiskSet::new(predictions, labels.labels())?;
        if rs.is_empty() {
            return Ok(f64::NAN);
        }
        let sum: f64 = (0..rs.len())
            .filter(|&i| rs.events()[i])
            .map(|i| rs.scores()[i] - rs.log_risk_set_sum(i))
            .sum();
        Ok(2.0 * sum / rs.len() as f64)
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "log_partial_likelihood"
    }
}

// =============================================================================
// Concordance index
// =============================================================================

/// Harrell's concordance index between risk scores and observed event order.
///
/// Forwards the scores untouched, in sample order, to
/// [`concordance_index_censored`] and reports its concordance. Errors from
/// that routine (all censored, no comparable pairs, non-finite scores)
/// propagate unchanged.
///
/// # Example
///
/// ```
/// use coxboost::{ConcordanceIndex, MetricFn};
/// use ndarray::array;
///
/// let metric = ConcordanceIndex::builder().tied_tol(1e-6).build().unwrap();
/// let c = metric.compute(array![3.0, 2.0, 1.0].view(), &array![1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(c, 1.0);
/// ```
///
/// Deserialization goes through the same validation as the builder.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(try_from = "RawConcordanceIndex")]
pub struct ConcordanceIndex {
    /// Score differences at or below this count as ties. Default: `1e-8`.
    #[builder(default = DEFAULT_TIED_TOL)]
    pub tied_tol: f64,

    /// Row-level parallelism for the pair counting.
    #[builder(default)]
    pub parallelism: Parallelism,
}

impl<S: concordance_index_builder::IsComplete> ConcordanceIndexBuilder<S> {
    /// Build and validate the metric.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTiedTolerance`] when `tied_tol` is
    /// negative or not finite.
    pub fn build(self) -> std::result::Result<ConcordanceIndex, ConfigError> {
        let metric = self.__build_internal();
        metric.validate()?;
        Ok(metric)
    }
}

fn default_tied_tol() -> f64 {
    DEFAULT_TIED_TOL
}

/// Unvalidated wire form of [`ConcordanceIndex`].
#[derive(Deserialize)]
struct RawConcordanceIndex {
    #[serde(default = "default_tied_tol")]
    tied_tol: f64,
    #[serde(default)]
    parallelism: Parallelism,
}

impl TryFrom<RawConcordanceIndex> for ConcordanceIndex {
    type Error = ConfigError;

    fn try_from(raw: RawConcordanceIndex) -> std::result::Result<Self, Self::Error> {
        let metric = Self {
            tied_tol: raw.tied_tol,
            parallelism: raw.parallelism,
        };
        metric.validate()?;
        Ok(metric)
    }
}

impl Default for ConcordanceIndex {
    fn default() -> Self {
        Self {
            tied_tol: DEFAULT_TIED_TOL,
            parallelism: Parallelism::Sequential,
        }
    }
}

impl ConcordanceIndex {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.tied_tol.is_finite() || self.tied_tol < 0.0 {
            return Err(ConfigError::InvalidTiedTolerance(self.tied_tol));
        }
        Ok(())
    }

    /// Concordance together with the pair counts behind it.
    pub fn summary(
        &self,
        predictions: ArrayView1<'_, f64>,
        labels: &dyn LabelSource,
    ) -> Result<ConcordanceSummary> {
        let (events, times) = split_labels(labels.labels());
        let estimates = predictions.to_vec();
        concordance_index_censored(&events, &times, &estimates, self.tied_tol, self.parallelism)
    }
}

impl MetricFn for ConcordanceIndex {
    fn compute(&self, predictions: ArrayView1<'_, f64>, labels: &dyn LabelSource) -> Result<f64> {
        Ok(self.summary(predictions, labels)?.concordance)
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "concordance_index"
    }
}
