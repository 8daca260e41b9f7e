//! Training-side components: objectives, metrics and evaluation.
//!
//! - [`objectives`]: Cox loss producing per-sample gradients/hessians
//! - [`metrics`]: Partial likelihood and concordance index
//! - [`eval`]: Per-round evaluation across named datasets
//! - [`RiskSet`]: Time-ordered risk sets shared by all of the above

pub mod eval;
pub mod gradients;
pub mod metrics;
pub mod objectives;
mod risk_set;

pub use eval::{EvalSet, Evaluator, MetricValue};
pub use gradients::{GradsTuple, split_grads};
pub use metrics::{
    ConcordanceIndex, ConcordanceSummary, CustomMetric, CustomMetricFn, DEFAULT_TIED_TOL, Metric,
    MetricFn, PartialLikelihood, concordance_index_censored,
};
pub use objectives::{CoxLoss, GradientStrategy, Objective, ObjectiveFn};
pub use risk_set::RiskSet;
