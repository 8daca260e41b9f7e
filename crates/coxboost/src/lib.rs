//! coxboost: Cox proportional-hazards training objective and survival
//! metrics for gradient boosting.
//!
//! The crate plugs into a second-order boosting loop through two callbacks:
//! an objective that turns risk scores into per-sample gradients and
//! hessians, and metrics that summarise model quality on censored data.
//!
//! # Key Types
//!
//! - [`CoxLoss`] - Negative Cox partial log-likelihood (gradients + hessians)
//! - [`PartialLikelihood`] / [`ConcordanceIndex`] - Evaluation metrics
//! - [`Objective`] / [`Metric`] - Dispatch wrappers with custom variants
//! - [`SurvivalTargets`] / [`SurvivalLabel`] - Sign-encoded survival labels
//!
//! # Label Encoding
//!
//! Boosting runtimes usually carry a single numeric label per sample, so
//! survival labels are sign-encoded: a positive label is an observed event
//! at `time = label`, a zero or negative label is censored at
//! `time = -label`.
//!
//! ```
//! use coxboost::{CoxLoss, MetricFn, ObjectiveFn, PartialLikelihood};
//! use ndarray::array;
//!
//! let scores = array![0.0, 0.0, 0.0];
//! let labels = array![1.0, 2.0, 3.0];
//!
//! let (grad, hess) = CoxLoss::default()
//!     .compute_gradients(scores.view(), &labels)
//!     .unwrap();
//! assert_eq!(grad.len(), 3);
//! assert!(hess.iter().all(|&h| h >= 0.0));
//!
//! let metric = PartialLikelihood.evaluate(scores.view(), &labels).unwrap();
//! assert_eq!(metric.name, "log_partial_likelihood");
//! assert!(metric.higher_is_better);
//! ```

// Re-export approx traits for users who want to compare gradients
pub use approx;

pub mod data;
pub mod error;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use data::{LabelSource, SurvivalLabel, SurvivalTargets};
pub use error::{ConfigError, LabelError, Result, SurvivalError};
pub use training::{
    ConcordanceIndex, ConcordanceSummary, CoxLoss, GradientStrategy, GradsTuple, Metric, MetricFn,
    MetricValue, Objective, ObjectiveFn, PartialLikelihood, RiskSet, concordance_index_censored,
};
pub use utils::{Parallelism, run_with_threads};
