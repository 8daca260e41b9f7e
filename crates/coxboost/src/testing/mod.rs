//! Testing utilities shared by unit tests, integration tests and benches.
//!
//! Synthetic survival data generators are seeded so every run sees the same
//! samples.

use rand::prelude::*;

use crate::data::SurvivalLabel;

/// Default tolerance for comparing gradients and metrics computed two ways.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Generate random risk scores uniform in `[min, max]`.
pub fn random_scores(n: usize, seed: u64, min: f64, max: f64) -> Vec<f64> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    (0..n).map(|_| min + rng.r#gen::<f64>() * width).collect()
}

/// Generate sign-encoded survival labels whose event times depend on `scores`.
///
/// Times are exponential with rate `exp(score)` (a proportional-hazards
/// model with unit baseline). Each sample is censored with probability
/// `censor_fraction`, in which case its censoring time is drawn uniformly
/// below the event time.
pub fn synthetic_survival_labels(scores: &[f64], seed: u64, censor_fraction: f64) -> Vec<f64> {
    assert!((0.0..=1.0).contains(&censor_fraction));
    let mut rng = StdRng::seed_from_u64(seed);
    scores
        .iter()
        .map(|&s| {
            // Shift away from zero so events never land on time 0
            let u: f64 = 1.0 - rng.r#gen::<f64>();
            let event_time = -u.ln() / s.exp() + 1e-6;
            let label = if rng.r#gen::<f64>() < censor_fraction {
                let t = event_time * rng.r#gen::<f64>();
                SurvivalLabel::censored(t)
            } else {
                SurvivalLabel::event(event_time)
            };
            label.map(SurvivalLabel::encode).unwrap_or(-event_time)
        })
        .collect()
}

/// Scores and matching labels in one call.
///
/// Returns `(scores, labels)`. Scores are uniform in `[-1, 1]`.
pub fn synthetic_survival(n: usize, seed: u64, censor_fraction: f64) -> (Vec<f64>, Vec<f64>) {
    let scores = random_scores(n, seed, -1.0, 1.0);
    let labels = synthetic_survival_labels(&scores, seed.wrapping_add(1), censor_fraction);
    (scores, labels)
}

/// Labels where a fraction of times are rounded to a coarse grid to force ties.
pub fn synthetic_tied_labels(n: usize, seed: u64, grid: f64, censor_fraction: f64) -> Vec<f64> {
    assert!(grid > 0.0);
    let (_, labels) = synthetic_survival(n, seed, censor_fraction);
    labels
        .into_iter()
        .map(|y| {
            let t = (y.abs() / grid).ceil() * grid;
            if y > 0.0 { t } else { -t }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_deterministic() {
        assert_eq!(synthetic_survival(50, 7, 0.3), synthetic_survival(50, 7, 0.3));
        assert_ne!(synthetic_survival(50, 7, 0.3), synthetic_survival(50, 8, 0.3));
    }

    #[test]
    fn censor_fraction_extremes() {
        let (_, labels) = synthetic_survival(100, 1, 0.0);
        assert!(labels.iter().all(|&y| y > 0.0));
        let (_, labels) = synthetic_survival(100, 1, 1.0);
        assert!(labels.iter().all(|&y| y <= 0.0));
    }

    #[test]
    fn tied_labels_share_grid_points() {
        let labels = synthetic_tied_labels(200, 3, 0.5, 0.2);
        for y in labels {
            let steps = y.abs() / 0.5;
            assert!((steps - steps.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn scores_in_range() {
        let s = random_scores(100, 0, -2.0, 3.0);
        assert!(s.iter().all(|&x| (-2.0..=3.0).contains(&x)));
    }
}
