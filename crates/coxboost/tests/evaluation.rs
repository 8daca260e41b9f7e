//! Integration tests for survival metrics and per-round evaluation.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};
use rstest::rstest;

use coxboost::testing::{random_scores, synthetic_survival, synthetic_survival_labels};
use coxboost::training::{CustomMetric, EvalSet, Evaluator};
use coxboost::{
    ConcordanceIndex, CoxLoss, Metric, MetricFn, ObjectiveFn, Parallelism, PartialLikelihood,
    SurvivalError, concordance_index_censored,
};

#[test]
fn frozen_fixture_metrics() {
    let scores = array![0.0, 0.0, 0.0];
    let labels = array![1.0, 2.0, 3.0];

    let pl = PartialLikelihood.compute(scores.view(), &labels).unwrap();
    assert_abs_diff_eq!(pl, -2.0 / 3.0 * 6f64.ln(), epsilon = 1e-12);

    let c = ConcordanceIndex::default().compute(scores.view(), &labels).unwrap();
    assert_abs_diff_eq!(c, 0.5, epsilon = 1e-12);
}

#[test]
fn partial_likelihood_matches_loss() {
    let (scores, labels) = synthetic_survival(200, 9, 0.3);
    let scores = Array1::from(scores);
    let labels = Array1::from(labels);

    let metric = PartialLikelihood.compute(scores.view(), &labels).unwrap();
    let loss = CoxLoss::default().loss(scores.view(), &labels).unwrap();
    assert_abs_diff_eq!(metric, -2.0 * loss / 200.0, epsilon = 1e-9);
}

#[test]
fn true_risk_scores_are_concordant() {
    // Labels are drawn from a proportional-hazards model driven by `scores`
    let (scores, labels) = synthetic_survival(2000, 42, 0.3);
    let c_true = ConcordanceIndex::default()
        .compute(Array1::from(scores.clone()).view(), &Array1::from(labels.clone()))
        .unwrap();
    let noise = random_scores(2000, 43, -1.0, 1.0);
    let c_noise = ConcordanceIndex::default()
        .compute(Array1::from(noise).view(), &Array1::from(labels))
        .unwrap();

    assert!(c_true > 0.58, "c_true = {c_true}");
    assert!(c_true > c_noise);
    assert!((c_noise - 0.5).abs() < 0.1, "c_noise = {c_noise}");
}

#[test]
fn better_scores_have_higher_partial_likelihood() {
    let scores = random_scores(1000, 7, -1.5, 1.5);
    let labels = Array1::from(synthetic_survival_labels(&scores, 8, 0.2));
    let zeros = Array1::<f64>::zeros(1000);

    let pl_true = PartialLikelihood.compute(Array1::from(scores).view(), &labels).unwrap();
    let pl_null = PartialLikelihood.compute(zeros.view(), &labels).unwrap();
    assert!(pl_true > pl_null);
}

#[rstest]
#[case::sequential(Parallelism::Sequential)]
#[case::parallel(Parallelism::Parallel)]
fn concordance_routine_counts(#[case] parallelism: Parallelism) {
    // Events at 1 and 3, censored at 1 and 2
    let events = [true, false, false, true];
    let times = [1.0, 1.0, 2.0, 3.0];
    let estimates = [0.9, 0.1, 0.9, 0.2];
    let s = concordance_index_censored(&events, &times, &estimates, 1e-8, parallelism).unwrap();

    // Event 0 vs {1, 2, 3}: concordant, tied, concordant. Event 3 has no later samples.
    assert_eq!(s.concordant, 2);
    assert_eq!(s.tied_risk, 1);
    assert_eq!(s.discordant, 0);
    assert_eq!(s.tied_time, 1);
    assert_abs_diff_eq!(s.concordance, 2.5 / 3.0, epsilon = 1e-12);
}

#[test]
fn concordance_summary_serializes() {
    let s = concordance_index_censored(&[true, true], &[1.0, 2.0], &[2.0, 1.0], 1e-8, Parallelism::Sequential)
        .unwrap();
    let json: serde_json::Value = serde_json::to_value(s).unwrap();
    assert_eq!(json["concordant"], 1);
    assert_eq!(json["concordance"], 1.0);
}

#[test]
fn evaluator_reports_train_and_eval_sets() {
    let (train_scores, train_labels) = synthetic_survival(300, 1, 0.3);
    let (valid_scores, valid_labels) = synthetic_survival(100, 2, 0.3);
    let train_labels = Array1::from(train_labels);
    let valid_labels = Array1::from(valid_labels);
    let train_scores = Array1::from(train_scores);
    let valid_scores = Array1::from(valid_scores);

    let metric = Metric::concordance();
    let evaluator = Evaluator::new(&metric);
    let sets = [EvalSet::new("valid", &valid_labels)];

    let values = evaluator
        .evaluate_round(0, train_scores.view(), &train_labels, &sets, &[valid_scores.view()])
        .unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].name, "train-concordance_index");
    assert_eq!(values[1].name, "valid-concordance_index");
    assert!(values.iter().all(|v| v.higher_is_better));

    let direct = ConcordanceIndex::default()
        .compute(valid_scores.view(), &valid_labels)
        .unwrap();
    let watched = evaluator.monitored(&values, Some("valid")).unwrap();
    assert_eq!(watched.value, direct);
    assert!(watched.improves_on(Some(0.0)));
    assert!(watched.to_string().ends_with("(max)"));
}

#[test]
fn custom_metric_through_evaluator() {
    let metric = Metric::custom(CustomMetric::new(
        "n_events",
        |_scores, labels| Ok(labels.iter().filter(|&&y| y > 0.0).count() as f64),
        true,
    ));
    let evaluator = Evaluator::new(&metric);
    let labels = array![1.0, -2.0, 3.0];
    let values = evaluator
        .evaluate_round(5, array![0.0, 0.0, 0.0].view(), &labels, &[], &[])
        .unwrap();
    assert_eq!(values[0].name, "train-n_events");
    assert_eq!(values[0].value, 2.0);
}

#[test]
fn metric_errors_surface_through_evaluate() {
    let err = Metric::concordance()
        .evaluate(array![0.3].view(), &array![1.0])
        .unwrap_err();
    assert_eq!(err, SurvivalError::NoComparablePairs);
}

#[test]
fn objective_and_metric_share_labels() {
    // One label array drives both callbacks of a boosting round
    let (scores, labels) = synthetic_survival(64, 17, 0.5);
    let scores = Array1::from(scores);
    let labels = Array1::from(labels);

    let (grad, hess) = CoxLoss::default().compute_gradients(scores.view(), &labels).unwrap();
    assert_eq!((grad.len(), hess.len()), (64, 64));

    let value = Metric::partial_likelihood().evaluate(scores.view(), &labels).unwrap();
    assert_eq!(value.name, "log_partial_likelihood");
    assert!(value.value <= 0.0);
}
