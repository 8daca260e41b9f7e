//! Harrell's concordance index for right-censored data.
//!
//! A pair `(i, j)` is comparable when `i` had an observed event and `j` was
//! still at risk afterwards: either `time_j > time_i`, or `j` was censored
//! at exactly `time_i`. Within a comparable pair the model is concordant
//! when it assigns the higher risk score to `i`. Score differences within
//! `tied_tol` count as half a concordant pair.

use serde::Serialize;

use crate::error::{Result, SurvivalError, check_len};
use crate::utils::{Parallelism, stable_argsort};

/// Default tolerance below which two risk scores are considered tied.
pub const DEFAULT_TIED_TOL: f64 = 1e-8;

/// Concordance index with its pair counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConcordanceSummary {
    /// `(concordant + tied_risk / 2) / comparable`, in `[0, 1]`.
    pub concordance: f64,
    pub concordant: usize,
    pub discordant: usize,
    /// Comparable pairs whose risk scores are tied.
    pub tied_risk: usize,
    /// Event/censored pairs that share a time (these are comparable).
    pub tied_time: usize,
}

impl ConcordanceSummary {
    #[inline]
    pub fn comparable(&self) -> usize {
        self.concordant + self.discordant + self.tied_risk
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PairCounts {
    comparable: usize,
    concordant: usize,
    tied_risk: usize,
}

impl std::ops::Add for PairCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            comparable: self.comparable + rhs.comparable,
            concordant: self.concordant + rhs.concordant,
            tied_risk: self.tied_risk + rhs.tied_risk,
        }
    }
}

/// One event row: the sorted position of the event and the tie group it belongs to.
#[derive(Debug, Clone, Copy)]
struct EventRow {
    pos: usize,
    group_start: usize,
    group_end: usize,
}

/// Compute Harrell's concordance index.
///
/// Inputs are in sample order and are not reordered by the caller; sorting
/// by time happens internally. Higher `estimates` mean higher risk.
///
/// # Errors
///
/// - [`SurvivalError::ShapeMismatch`] when lengths differ
/// - [`SurvivalError::NonFiniteScore`] when an estimate is NaN or infinite
/// - [`SurvivalError::AllCensored`] when there is no observed event
/// - [`SurvivalError::NoComparablePairs`] when no pair is comparable
pub fn concordance_index_censored(
    events: &[bool],
    times: &[f64],
    estimates: &[f64],
    tied_tol: f64,
    parallelism: Parallelism,
) -> Result<ConcordanceSummary> {
    check_len("times", events.len(), times.len())?;
    check_len("estimates", events.len(), estimates.len())?;
    if let Some(index) = estimates.iter().position(|s| !s.is_finite()) {
        return Err(SurvivalError::NonFiniteScore {
            index,
            value: estimates[index],
        });
    }
    if !events.iter().any(|&e| e) {
        return Err(SurvivalError::AllCensored);
    }

    let order = stable_argsort(times);
    let n = order.len();

    // Group samples sharing a time; each event in a group is one row.
    let mut rows = Vec::new();
    let mut tied_time = 0;
    let mut start = 0;
    while start < n {
        let t = times[order[start]];
        let mut end = start + 1;
        while end < n && times[order[end]] == t {
            end += 1;
        }
        let n_censored = (start..end).filter(|&p| !events[order[p]]).count();
        for pos in (start..end).filter(|&p| events[order[p]]) {
            rows.push(EventRow {
                pos,
                group_start: start,
                group_end: end,
            });
            tied_time += n_censored;
        }
        start = end;
    }

    let count_row = |row: EventRow| -> PairCounts {
        let est_i = estimates[order[row.pos]];
        let at_risk = (row.group_start..row.group_end)
            .filter(|&p| !events[order[p]])
            .chain(row.group_end..n);

        let mut counts = PairCounts::default();
        for p in at_risk {
            let est_j = estimates[order[p]];
            counts.comparable += 1;
            if (est_j - est_i).abs() <= tied_tol {
                counts.tied_risk += 1;
            } else if est_j < est_i {
                counts.concordant += 1;
            }
        }
        counts
    };

    let total = parallelism
        .maybe_par_map(rows, count_row)
        .into_iter()
        .fold(PairCounts::default(), |acc, c| acc + c);

    if total.comparable == 0 {
        return Err(SurvivalError::NoComparablePairs);
    }

    let concordance =
        (total.concordant as f64 + 0.5 * total.tied_risk as f64) / total.comparable as f64;
    Ok(ConcordanceSummary {
        concordance,
        concordant: total.concordant,
        discordant: total.comparable - total.concordant - total.tied_risk,
        tied_risk: total.tied_risk,
        tied_time,
    })
}
