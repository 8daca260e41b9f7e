//! Integration tests for the Cox objective through the public API.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};
use rstest::rstest;

use coxboost::testing::{DEFAULT_TOLERANCE, synthetic_survival, synthetic_tied_labels};
use coxboost::{
    CoxLoss, GradientStrategy, Objective, ObjectiveFn, Parallelism, RiskSet, SurvivalError,
    SurvivalTargets, run_with_threads,
};

fn loss_for(strategy: GradientStrategy, parallelism: Parallelism) -> CoxLoss {
    CoxLoss::builder()
        .strategy(strategy)
        .parallelism(parallelism)
        .build()
}

#[rstest]
#[case::linear(GradientStrategy::Linear, Parallelism::Sequential)]
#[case::dense(GradientStrategy::Dense, Parallelism::Sequential)]
#[case::dense_parallel(GradientStrategy::Dense, Parallelism::Parallel)]
fn frozen_three_point_fixture(#[case] strategy: GradientStrategy, #[case] parallelism: Parallelism) {
    let (grad, hess) = loss_for(strategy, parallelism)
        .compute_gradients(array![0.0, 0.0, 0.0].view(), &array![1.0, 2.0, 3.0])
        .unwrap();

    let expected_grad = [-2.0 / 3.0, -1.0 / 6.0, 5.0 / 6.0];
    let expected_hess = [2.0 / 9.0, 17.0 / 36.0, 17.0 / 36.0];
    for i in 0..3 {
        assert_abs_diff_eq!(grad[i], expected_grad[i], epsilon = 1e-12);
        assert_abs_diff_eq!(hess[i], expected_hess[i], epsilon = 1e-12);
    }
}

#[rstest]
#[case::linear(GradientStrategy::Linear)]
#[case::dense(GradientStrategy::Dense)]
fn zero_events_give_zero_gradients(#[case] strategy: GradientStrategy) {
    let (grad, hess) = loss_for(strategy, Parallelism::Sequential)
        .compute_gradients(array![0.3, -2.0, 1.1, 0.0].view(), &array![-1.0, -4.0, 0.0, -2.5])
        .unwrap();
    assert!(grad.iter().all(|&g| g == 0.0));
    assert!(hess.iter().all(|&h| h == 0.0));
}

#[rstest]
#[case(-3.0)]
#[case(0.0)]
#[case(12.5)]
fn single_observation(#[case] score: f64) {
    let loss = CoxLoss::default();
    let (grad, hess) = loss.compute_gradients(array![score].view(), &array![4.0]).unwrap();
    assert_abs_diff_eq!(grad[0], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(hess[0], 0.0, epsilon = 1e-12);

    let (grad, hess) = loss.compute_gradients(array![score].view(), &array![-4.0]).unwrap();
    assert_eq!((grad[0], hess[0]), (0.0, 0.0));
}

#[test]
fn strategies_agree_on_synthetic_data() {
    for (n, censor) in [(10, 0.0), (257, 0.3), (1000, 0.8)] {
        let (scores, labels) = synthetic_survival(n, n as u64, censor);
        let scores = Array1::from(scores);
        let labels = Array1::from(labels);

        let (g_lin, h_lin) = loss_for(GradientStrategy::Linear, Parallelism::Sequential)
            .compute_gradients(scores.view(), &labels)
            .unwrap();
        let (g_dense, h_dense) = loss_for(GradientStrategy::Dense, Parallelism::Parallel)
            .compute_gradients(scores.view(), &labels)
            .unwrap();

        for i in 0..n {
            assert_abs_diff_eq!(g_lin[i], g_dense[i], epsilon = DEFAULT_TOLERANCE);
            assert_abs_diff_eq!(h_lin[i], h_dense[i], epsilon = DEFAULT_TOLERANCE);
        }
    }
}

#[test]
fn gradient_sums_to_zero_when_all_events() {
    let (scores, _) = synthetic_survival(300, 11, 0.0);
    let labels: Array1<f64> = (1..=300).map(|t| t as f64).collect();
    let (grad, _) = CoxLoss::default()
        .compute_gradients(Array1::from(scores).view(), &labels)
        .unwrap();
    assert_abs_diff_eq!(grad.sum(), 0.0, epsilon = 1e-9);
}

#[test]
fn hessians_are_non_negative() {
    let (scores, labels) = synthetic_survival(500, 5, 0.4);
    let (_, hess) = CoxLoss::default()
        .compute_gradients(Array1::from(scores).view(), &Array1::from(labels))
        .unwrap();
    assert!(hess.iter().all(|&h| h >= -1e-15));
}

#[test]
fn tie_handling_is_deterministic() {
    let labels = Array1::from(synthetic_tied_labels(400, 21, 0.25, 0.3));
    let (scores, _) = synthetic_survival(400, 22, 0.0);
    let scores = Array1::from(scores);
    let loss = CoxLoss::default();

    let first = loss.compute_gradients(scores.view(), &labels).unwrap();
    for _ in 0..3 {
        assert_eq!(loss.compute_gradients(scores.view(), &labels).unwrap(), first);
    }
}

#[test]
fn censored_at_time_zero_stays_in_risk_set() {
    // Sample 0 is censored at time zero and sorts first
    let scores = array![0.0, 0.0, 0.0];
    let labels = array![0.0, 1.0, 2.0];
    let rs = RiskSet::new(scores.view(), labels.view()).unwrap();
    assert_eq!(rs.order(), &[0, 1, 2]);
    assert_abs_diff_eq!(rs.risk_set_sum()[0], 3.0, epsilon = 1e-12);

    let (grad, hess) = CoxLoss::default().compute_gradients(scores.view(), &labels).unwrap();
    // Censored sample precedes every event, so no risk set includes it
    assert_abs_diff_eq!(grad[0], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(hess[0], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(grad[1], 0.5 - 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(grad[2], 0.5 + 1.0 - 1.0, epsilon = 1e-12);
}

#[test]
fn survival_targets_are_a_label_source() {
    let targets = SurvivalTargets::from_times_events(&[1.0, 2.0, 3.0], &[true, true, true]).unwrap();
    let (grad, _) = Objective::cox()
        .compute_gradients(array![0.0, 0.0, 0.0].view(), &targets)
        .unwrap();
    assert_abs_diff_eq!(grad[0], -2.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn invalid_labels_report_their_index() {
    let err = SurvivalTargets::from_times_events(&[1.0, 0.0], &[true, true]).unwrap_err();
    assert!(matches!(err, SurvivalError::Label { index: 1, .. }));
}

#[test]
fn shape_mismatch_fails_fast() {
    let err = CoxLoss::default()
        .compute_gradients(array![0.0, 1.0].view(), &array![1.0])
        .unwrap_err();
    assert!(matches!(
        err,
        SurvivalError::ShapeMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn bounded_thread_pool_matches_sequential() {
    let (scores, labels) = synthetic_survival(800, 3, 0.5);
    let scores = Array1::from(scores);
    let labels = Array1::from(labels);

    let sequential = loss_for(GradientStrategy::Dense, Parallelism::Sequential)
        .compute_gradients(scores.view(), &labels)
        .unwrap();
    let pooled = run_with_threads(3, |par| {
        loss_for(GradientStrategy::Dense, par).compute_gradients(scores.view(), &labels)
    })
    .unwrap()
    .unwrap();

    for i in 0..800 {
        assert_abs_diff_eq!(sequential.0[i], pooled.0[i], epsilon = 1e-12);
        assert_abs_diff_eq!(sequential.1[i], pooled.1[i], epsilon = 1e-12);
    }
}
