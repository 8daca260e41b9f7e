//! Gradient/hessian pair storage.

use ndarray::{Array1, ArrayView1};

/// First and second derivative of the loss with respect to one prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradsTuple {
    /// Gradient (∂L/∂pred).
    pub grad: f64,
    /// Hessian (∂²L/∂pred²).
    pub hess: f64,
}

impl GradsTuple {
    #[inline]
    pub fn new(grad: f64, hess: f64) -> Self {
        Self { grad, hess }
    }
}

/// Split interleaved pairs into separate gradient and hessian arrays.
///
/// This is the shape boosting runtimes expect back from a custom objective.
pub fn split_grads(pairs: ArrayView1<'_, GradsTuple>) -> (Array1<f64>, Array1<f64>) {
    let grad = pairs.iter().map(|gh| gh.grad).collect();
    let hess = pairs.iter().map(|gh| gh.hess).collect();
    (grad, hess)
}
