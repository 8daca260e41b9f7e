//! Time-ordered risk sets shared by the Cox objective and metrics.
//!
//! Every Cox computation starts the same way: sort samples by time, line up
//! the event indicators and scores with that order, and accumulate hazards
//! from the latest time backwards so that `R_i` is the total hazard of
//! everyone still at risk at the `i`-th sorted time.
//!
//! # Tie-breaking
//!
//! Samples are sorted with a stable sort on time. Tied times keep their
//! original relative order, so the earlier-indexed sample of a tie sees the
//! later one in its risk set but not vice versa. Results are deterministic
//! for a given input order.
//!
//! # Stabilisation
//!
//! `log R_i` is accumulated directly as a reverse running log-sum-exp, so
//! every entry is stabilised against its own maximum rather than one global
//! offset. Score spreads far beyond the `exp` range (e.g. `[-700, 50]`)
//! keep finite log sums, and ratios `exp(s_i - log R_k)` never exceed one
//! for `k ≤ i`. [`RiskSet::hazard`] and [`RiskSet::risk_set_sum`] are the
//! same quantities on the natural scale and may overflow; the objective and
//! metrics only read the log scale.

use ndarray::ArrayView1;

use crate::data::SurvivalLabel;
use crate::error::{Result, check_len};
use crate::utils::{invert_permutation, stable_argsort};

/// `log(exp(a) + exp(b))` without overflow. `-inf` is the identity and NaN
/// propagates.
#[inline]
pub(crate) fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Samples sorted by time with their log risk-set sums.
///
/// All per-sample vectors are indexed by *sorted* position.
#[derive(Debug, Clone)]
pub struct RiskSet {
    order: Vec<usize>,
    rank: Vec<usize>,
    times: Vec<f64>,
    events: Vec<bool>,
    scores: Vec<f64>,
    log_risk: Vec<f64>,
}

impl RiskSet {
    /// Build the risk set for `scores` and sign-encoded `labels`.
    ///
    /// Fails only when the lengths differ. Non-finite scores are carried
    /// through and show up as NaN/Inf in the derived quantities.
    pub fn new(scores: ArrayView1<'_, f64>, labels: ArrayView1<'_, f64>) -> Result<Self> {
        check_len("labels", scores.len(), labels.len())?;

        let decoded: Vec<SurvivalLabel> = labels.iter().copied().map(SurvivalLabel::decode).collect();
        let raw_times: Vec<f64> = decoded.iter().map(|l| l.time()).collect();
        let order = stable_argsort(&raw_times);
        let rank = invert_permutation(&order);

        let times: Vec<f64> = order.iter().map(|&i| raw_times[i]).collect();
        let events: Vec<bool> = order.iter().map(|&i| decoded[i].is_event()).collect();
        let scores: Vec<f64> = order.iter().map(|&i| scores[i]).collect();

        let mut log_risk = vec![0.0; scores.len()];
        let mut acc = f64::NEG_INFINITY;
        for (lse, &s) in log_risk.iter_mut().zip(&scores).rev() {
            acc = log_add_exp(acc, s);
            *lse = acc;
        }

        log::trace!(
            "risk set: n={}, events={}, log_risk[0]={:?}",
            order.len(),
            events.iter().filter(|&&e| e).count(),
            log_risk.first()
        );

        Ok(Self {
            order,
            rank,
            times,
            events,
            scores,
            log_risk,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Original indices in ascending time order.
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Sorted position of each original index (inverse of [`Self::order`]).
    #[inline]
    pub fn rank(&self) -> &[usize] {
        &self.rank
    }

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn events(&self) -> &[bool] {
        &self.events
    }

    #[inline]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// `exp(score)` in sorted order.
    pub fn hazard(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.exp()).collect()
    }

    /// `R_i = Σ_{j ≥ i} exp(score_j)`; non-increasing.
    pub fn risk_set_sum(&self) -> Vec<f64> {
        self.log_risk.iter().map(|l| l.exp()).collect()
    }

    /// `log R_i` for every sorted position.
    #[inline]
    pub fn log_risk_set_sums(&self) -> &[f64] {
        &self.log_risk
    }

    /// `log R_i = log(Σ_{j ≥ i} exp(score_j))`.
    #[inline]
    pub fn log_risk_set_sum(&self, i: usize) -> f64 {
        self.log_risk[i]
    }

    /// `exp(score_i) / R_k`, evaluated in log space.
    #[inline]
    pub fn hazard_ratio(&self, i: usize, k: usize) -> f64 {
        (self.scores[i] - self.log_risk[k]).exp()
    }

    pub fn n_events(&self) -> usize {
        self.events.iter().filter(|&&e| e).count()
    }

    /// Event indicator as `0.0` / `1.0`.
    #[inline]
    pub fn event_weight(&self, i: usize) -> f64 {
        if self.events[i] { 1.0 } else { 0.0 }
    }

    /// Map values in sorted order back to original sample order.
    pub fn unsort<T: Copy>(&self, sorted: &[T]) -> Vec<T> {
        self.rank.iter().map(|&r| sorted[r]).collect()
    }
}
