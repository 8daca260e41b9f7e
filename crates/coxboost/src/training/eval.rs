//! Evaluation utilities for training.
//!
//! Provides the [`Evaluator`] component for computing a metric on the
//! training set and any number of named evaluation sets each round, and
//! [`MetricValue`] for wrapping computed metrics with metadata.

use ndarray::ArrayView1;
use serde::Serialize;

use super::metrics::MetricFn;
use crate::data::LabelSource;
use crate::error::{Result, check_len};

// =============================================================================
// MetricValue
// =============================================================================

/// One metric reading, tagged with the set it was computed on.
///
/// Survival metrics can be undefined (empty input gives a NaN partial
/// likelihood), so comparisons treat NaN as never improving on anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    /// `"{set}-{metric}"`, e.g. `"valid-concordance_index"`, or the bare
    /// metric name outside an evaluator.
    pub name: String,
    pub value: f64,
    pub higher_is_better: bool,
}

impl MetricValue {
    pub fn new(name: impl Into<String>, value: f64, higher_is_better: bool) -> Self {
        Self {
            name: name.into(),
            value,
            higher_is_better,
        }
    }

    /// `"max"` or `"min"`, the direction in which this metric improves.
    pub fn direction(&self) -> &'static str {
        if self.higher_is_better { "max" } else { "min" }
    }

    /// Whether this reading beats `best`, the best value seen so far.
    ///
    /// Any finite reading improves on `None` or on a NaN best. A NaN
    /// reading never improves.
    pub fn improves_on(&self, best: Option<f64>) -> bool {
        if self.value.is_nan() {
            return false;
        }
        match best {
            Some(best) if !best.is_nan() => {
                if self.higher_is_better {
                    self.value > best
                } else {
                    self.value < best
                }
            }
            _ => true,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.6} ({})", self.name, self.value, self.direction())
    }
}

// =============================================================================
// EvalSet
// =============================================================================

/// Named evaluation labels.
#[derive(Clone, Copy)]
pub struct EvalSet<'a> {
    pub name: &'a str,
    pub labels: &'a dyn LabelSource,
}

impl<'a> EvalSet<'a> {
    pub fn new(name: &'a str, labels: &'a dyn LabelSource) -> Self {
        Self { name, labels }
    }
}

impl std::fmt::Debug for EvalSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalSet")
            .field("name", &self.name)
            .field("n_samples", &self.labels.labels().len())
            .finish()
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Computes one metric on the training set and each eval set per round.
///
/// # Example
///
/// ```
/// use coxboost::training::{EvalSet, Evaluator};
/// use coxboost::Metric;
/// use ndarray::array;
///
/// let metric = Metric::concordance();
/// let evaluator = Evaluator::new(&metric);
///
/// let train_labels = array![1.0, 2.0, 3.0];
/// let valid_labels = array![2.0, -1.0, 1.0];
/// let valid = [EvalSet::new("valid", &valid_labels)];
///
/// let train_scores = array![3.0, 2.0, 1.0];
/// let valid_scores = array![0.5, 0.2, 0.9];
/// let values = evaluator
///     .evaluate_round(0, train_scores.view(), &train_labels, &valid, &[valid_scores.view()])
///     .unwrap();
/// assert_eq!(values[0].name, "train-concordance_index");
/// assert_eq!(values[1].name, "valid-concordance_index");
/// ```
pub struct Evaluator<'a, M: MetricFn + ?Sized> {
    metric: &'a M,
}

impl<'a, M: MetricFn + ?Sized> Evaluator<'a, M> {
    pub fn new(metric: &'a M) -> Self {
        Self { metric }
    }

    pub fn higher_is_better(&self) -> bool {
        self.metric.higher_is_better()
    }

    pub fn metric_name(&self) -> &'static str {
        self.metric.name()
    }

    /// When `false`, evaluation should be skipped entirely.
    pub fn is_enabled(&self) -> bool {
        self.metric.is_enabled()
    }

    /// Compute the metric and wrap it under `name`.
    pub fn compute_metric(
        &self,
        name: impl Into<String>,
        predictions: ArrayView1<'_, f64>,
        labels: &dyn LabelSource,
    ) -> Result<MetricValue> {
        let value = self.metric.compute(predictions, labels)?;
        Ok(MetricValue::new(name, value, self.higher_is_better()))
    }

    /// Evaluate predictions on the training set and every eval set for one round.
    ///
    /// Returns training first, then eval sets in order. Returns an empty
    /// vector when the metric is disabled. `eval_predictions[i]` must belong
    /// to `eval_sets[i]`.
    pub fn evaluate_round(
        &self,
        round: usize,
        train_predictions: ArrayView1<'_, f64>,
        train_labels: &dyn LabelSource,
        eval_sets: &[EvalSet<'_>],
        eval_predictions: &[ArrayView1<'_, f64>],
    ) -> Result<Vec<MetricValue>> {
        if !self.metric.is_enabled() {
            return Ok(Vec::new());
        }
        check_len("eval_predictions", eval_sets.len(), eval_predictions.len())?;

        let mut metrics = Vec::with_capacity(1 + eval_sets.len());
        metrics.push(self.compute_metric(
            format!("train-{}", self.metric_name()),
            train_predictions,
            train_labels,
        )?);

        for (eval_set, &preds) in eval_sets.iter().zip(eval_predictions) {
            metrics.push(self.compute_metric(
                format!("{}-{}", eval_set.name, self.metric_name()),
                preds,
                eval_set.labels,
            )?);
        }

        if log::log_enabled!(log::Level::Info) {
            let line: Vec<String> = metrics.iter().map(ToString::to_string).collect();
            log::info!("[{round}] {}", line.join("  "));
        }

        Ok(metrics)
    }

    /// The reading early stopping should watch in one round's output.
    ///
    /// With `set` given, looks up that eval set's value by name. Without
    /// it, picks the last eval set, or the training value when there are
    /// no eval sets. `None` when the named set is absent or the round was
    /// skipped.
    pub fn monitored<'m>(
        &self,
        metrics: &'m [MetricValue],
        set: Option<&str>,
    ) -> Option<&'m MetricValue> {
        match set {
            Some(set) => {
                let name = format!("{set}-{}", self.metric_name());
                metrics.iter().find(|m| m.name == name)
            }
            None => metrics.last(),
        }
    }
}
