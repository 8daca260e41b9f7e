//! Objective (loss) functions for survival boosting.
//!
//! An objective turns the current raw scores into per-sample gradients and
//! hessians for a second-order (Newton) boosting step.
//!
//! # Available Objectives
//!
//! - [`CoxLoss`]: Negative Cox partial log-likelihood

mod cox;

pub use cox::{CoxLoss, GradientStrategy};

use std::sync::Arc;

use ndarray::{Array1, ArrayView1, ArrayViewMut1};

use crate::data::LabelSource;
use crate::error::Result;
use crate::training::GradsTuple;
use crate::training::gradients::split_grads;

// =============================================================================
// Objective Trait
// =============================================================================

/// An objective (loss) function for training gradient boosted models.
///
/// Called once per boosting round with the ensemble's current raw scores.
/// Implementations must be pure: no state may carry over between calls.
pub trait ObjectiveFn: Send + Sync {
    /// Compute gradients and hessians into `grad_hess`, in sample order.
    ///
    /// `predictions`, the labels and `grad_hess` must all have the same length.
    fn compute_gradients_into(
        &self,
        predictions: ArrayView1<'_, f64>,
        labels: &dyn LabelSource,
        grad_hess: ArrayViewMut1<'_, GradsTuple>,
    ) -> Result<()>;

    /// Compute gradients and hessians as two separate arrays.
    ///
    /// This is the `(gradient, hessian)` pair boosting runtimes expect back
    /// from a custom objective callback.
    fn compute_gradients(
        &self,
        predictions: ArrayView1<'_, f64>,
        labels: &dyn LabelSource,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        let mut grad_hess = Array1::from_elem(predictions.len(), GradsTuple::default());
        self.compute_gradients_into(predictions, labels, grad_hess.view_mut())?;
        Ok(split_grads(grad_hess.view()))
    }

    /// Optimal constant score before any trees are added.
    fn compute_base_score(&self, labels: &dyn LabelSource) -> f64;

    /// Name of the objective (for logging).
    fn name(&self) -> &'static str;
}

// =============================================================================
// Objective Enum (Convenience wrapper)
// =============================================================================

/// Objective function enum for configuration.
///
/// Wraps the built-in objectives and user implementations behind one type
/// that itself implements [`ObjectiveFn`].
#[derive(Clone)]
pub enum Objective {
    /// Cox proportional-hazards partial likelihood.
    Cox(CoxLoss),
    /// Custom objective (user-provided implementation).
    Custom(Arc<dyn ObjectiveFn>),
}

impl std::fmt::Debug for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cox(inner) => f.debug_tuple("Cox").field(inner).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<dyn ObjectiveFn>").finish(),
        }
    }
}

impl Objective {
    /// Cox partial likelihood with default settings.
    pub fn cox() -> Self {
        Self::Cox(CoxLoss::default())
    }

    /// Custom objective with user-provided implementation.
    pub fn custom<O: ObjectiveFn + 'static>(objective: O) -> Self {
        Self::Custom(Arc::new(objective))
    }
}

impl Default for Objective {
    fn default() -> Self {
        Self::cox()
    }
}

impl From<CoxLoss> for Objective {
    fn from(loss: CoxLoss) -> Self {
        Self::Cox(loss)
    }
}

impl ObjectiveFn for Objective {
    fn compute_gradients_into(
        &self,
        predictions: ArrayView1<'_, f64>,
        labels: &dyn LabelSource,
        grad_hess: ArrayViewMut1<'_, GradsTuple>,
    ) -> Result<()> {
        match self {
            Self::Cox(inner) => inner.compute_gradients_into(predictions, labels, grad_hess),
            Self::Custom(inner) => inner.compute_gradients_into(predictions, labels, grad_hess),
        }
    }

    fn compute_base_score(&self, labels: &dyn LabelSource) -> f64 {
        match self {
            Self::Cox(inner) => inner.compute_base_score(labels),
            Self::Custom(inner) => inner.compute_base_score(labels),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Cox(inner) => inner.name(),
            Self::Custom(inner) => inner.name(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
