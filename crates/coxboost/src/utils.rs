//! Parallelism configuration and sorting helpers shared across the crate.

use rayon::prelude::*;

// =============================================================================
// Sorting
// =============================================================================

/// Indices that stably sort `keys` in ascending order.
///
/// Uses [`f64::total_cmp`], so the result is deterministic even when keys
/// contain NaN (positive NaN sorts after `+inf`). Equal keys keep their
/// original relative order.
pub fn stable_argsort(keys: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..keys.len()).collect();
    indices.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
    indices
}

/// Inverse of a permutation: `inverse[perm[i]] == i`.
pub fn invert_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// Components that have embarrassingly parallel inner loops (dense gradient
/// rows, concordance rows) consult this flag and use `rayon` when it is
/// [`Parallelism::Parallel`]. Components never build their own thread pools;
/// wrap the call in [`run_with_threads`] to bound the worker count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map `f` over `iter`, in parallel when allowed. Output order matches input order.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use the global pool)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// # Example
///
/// ```
/// use coxboost::{run_with_threads, Parallelism};
///
/// let p = run_with_threads(1, |parallelism| parallelism).unwrap();
/// assert_eq!(p, Parallelism::Sequential);
/// ```
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel if n_threads == 0 => Ok(f(Parallelism::Parallel)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}
