use autoreg_od::{
    combine, evaluate_labels, fit_transform, matrix_from_rows, valid_window_count,
    CollectiveDetector, CombinationMethod, MultiAutoRegConfig, MultiAutoRegOD, OutlierError,
    ProbabilityMethod,
};
use ndarray::{s, Array2};

fn sample_rows() -> Vec<Vec<f64>> {
    vec![
        vec![3., 5.],
        vec![5., 9.],
        vec![7., 2.],
        vec![42., 20.],
        vec![8., 12.],
        vec![10., 12.],
        vec![12., 12.],
        vec![18., 16.],
        vec![20., 7.],
        vec![18., 10.],
        vec![23., 12.],
        vec![22., 15.],
    ]
}

fn sample() -> Array2<f64> {
    matrix_from_rows(&sample_rows()).unwrap()
}

fn config() -> MultiAutoRegConfig {
    MultiAutoRegConfig::new(3)
        .with_step_size(1)
        .with_contamination(0.2)
        .with_method(CombinationMethod::Average)
}

fn fitted(config: MultiAutoRegConfig) -> MultiAutoRegOD {
    let mut clf = MultiAutoRegOD::with_config(config).unwrap();
    clf.fit(sample().view()).unwrap();
    clf
}

#[test]
fn fit_produces_one_score_per_valid_window() {
    let clf = fitted(config());
    assert_eq!(clf.valid_len().unwrap(), 9);
    assert_eq!(clf.decision_scores().unwrap().len(), 9);
    assert_eq!(clf.left_inds().unwrap()[0], 0);
    assert_eq!(clf.right_inds().unwrap()[0], 3);
    assert_eq!(clf.left_inds().unwrap().len(), 9);
    assert_eq!(clf.right_inds().unwrap()[8], 11);
}

#[test]
fn refitting_identical_data_is_deterministic() {
    let a = fitted(config());
    let b = fitted(config());
    assert_eq!(a.decision_scores().unwrap(), b.decision_scores().unwrap());
    assert_eq!(a.labels().unwrap(), b.labels().unwrap());
}

#[test]
fn training_labels_follow_contamination() {
    let clf = fitted(config());
    let labels = clf.labels().unwrap();
    let threshold = clf.threshold().unwrap().threshold;
    assert_eq!(labels.iter().filter(|&&l| l == 1).count(), 2);
    for (label, score) in labels.iter().zip(clf.decision_scores().unwrap().iter()) {
        assert_eq!(*label == 1, *score > threshold);
    }
}

#[test]
fn decision_function_appends_minimum_filler() {
    let clf = fitted(config());
    let scored = clf.decision_function(sample().view()).unwrap();
    let expected_len = valid_window_count(12, 3, 1).unwrap();
    assert_eq!(scored.values.len(), expected_len);
    assert_eq!(scored.values.len(), 9);
    assert_eq!(scored.bounds.len(), 9);

    let head = scored.values.slice(s![..8]);
    let min = head.iter().copied().fold(f64::INFINITY, f64::min);
    assert_eq!(scored.values[8], min);
}

#[test]
fn decision_function_reuses_training_statistics() {
    let clf = fitted(config());
    let scored = clf.decision_function(sample().view()).unwrap();
    let train = clf.decision_scores().unwrap();
    for i in 0..8 {
        assert!((scored.values[i] - train[i]).abs() < 1e-9);
    }
}

#[test]
fn decision_function_is_idempotent() {
    let clf = fitted(config());
    let first = clf.decision_function(sample().view()).unwrap();
    let second = clf.decision_function(sample().view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn weights_default_to_uniform_ones() {
    let clf = fitted(config());
    assert_eq!(clf.weights().unwrap().to_vec(), vec![1.0, 1.0]);
}

#[test]
fn wrong_weight_length_is_rejected() {
    let mut clf = MultiAutoRegOD::with_config(config().with_weights(vec![1.0, 2.0, 3.0])).unwrap();
    let err = clf.fit(sample().view()).unwrap_err();
    assert!(matches!(
        err,
        OutlierError::DimensionMismatch {
            expected: 2,
            got: 3,
            ..
        }
    ));
    assert!(!clf.is_fitted());
}

#[test]
fn weights_are_scale_invariant() {
    let a = fitted(config().with_weights(vec![1.0, 3.0]));
    let b = fitted(config().with_weights(vec![2.0, 6.0]));
    assert_eq!(a.decision_scores().unwrap(), b.decision_scores().unwrap());
    let w = a.weights().unwrap();
    assert!((w.sum() - 2.0).abs() < 1e-12);
}

#[test]
fn maximization_takes_row_max_of_standardized_scores() {
    let clf = fitted(config().with_method(CombinationMethod::Maximization));
    let models = clf.models().unwrap();
    let mut raw = Array2::<f64>::zeros((9, 2));
    for (j, model) in models.iter().enumerate() {
        raw.column_mut(j).assign(model.decision_scores().unwrap());
    }
    let (scaled, _) = fit_transform(raw.view()).unwrap();
    let expected = combine(scaled.view(), CombinationMethod::Maximization, None).unwrap();
    assert_eq!(clf.decision_scores().unwrap(), &expected);
    for (i, row) in scaled.rows().into_iter().enumerate() {
        assert_eq!(expected[i], row[0].max(row[1]));
    }
}

#[test]
fn median_of_two_dimensions_equals_average() {
    let avg = fitted(config());
    let med = fitted(config().with_method(CombinationMethod::Median));
    for (a, m) in avg
        .decision_scores()
        .unwrap()
        .iter()
        .zip(med.decision_scores().unwrap().iter())
    {
        assert!((a - m).abs() < 1e-12);
    }
}

#[test]
fn unsupported_method_is_rejected_at_configuration() {
    let err = "bogus".parse::<CombinationMethod>().unwrap_err();
    assert_eq!(
        err,
        OutlierError::UnsupportedCombinationMethod("bogus".to_string())
    );
}

#[test]
fn window_not_shorter_than_series_is_rejected() {
    let x = sample().slice(s![..3, ..]).to_owned();
    let mut clf = MultiAutoRegOD::with_config(config()).unwrap();
    assert!(matches!(
        clf.fit(x.view()),
        Err(OutlierError::InvalidWindowConfig(_))
    ));

    let clf = fitted(config());
    assert!(matches!(
        clf.decision_function(x.view()),
        Err(OutlierError::InvalidWindowConfig(_))
    ));
}

#[test]
fn scoring_before_fit_fails() {
    let clf = MultiAutoRegOD::with_config(config()).unwrap();
    assert_eq!(
        clf.decision_function(sample().view()).unwrap_err(),
        OutlierError::NotFitted
    );
    assert!(matches!(clf.predict(sample().view()), Err(OutlierError::NotFitted)));
}

#[test]
fn predict_and_predict_proba_share_bounds() {
    let clf = fitted(config());
    let labels = clf.predict(sample().view()).unwrap();
    let probs = clf
        .predict_proba(sample().view(), ProbabilityMethod::Linear)
        .unwrap();
    assert_eq!(labels.values.len(), 9);
    assert_eq!(probs.values.dim(), (9, 2));
    assert_eq!(labels.bounds, probs.bounds);
    assert!(labels.values.iter().all(|&l| l <= 1));
    for row in probs.values.rows() {
        assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }

    let unify = clf
        .predict_proba(sample().view(), ProbabilityMethod::Unify)
        .unwrap();
    assert!(unify.values.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn longer_step_uses_fewer_windows() {
    let clf = fitted(config().with_step_size(2));
    // windows start at 0, 2, 4, 6, 8
    assert_eq!(clf.valid_len().unwrap(), 5);
    assert_eq!(clf.left_inds().unwrap(), &[0, 2, 4, 6, 8]);
    assert_eq!(clf.right_inds().unwrap(), &[3, 5, 7, 9, 11]);
}

#[test]
fn labels_can_be_ranked_against_ground_truth() {
    let clf = fitted(config());
    let predicted = clf.labels().unwrap().to_vec();
    let metrics = evaluate_labels(&predicted, &predicted).unwrap();
    assert_eq!(metrics.f1, 1.0);
}

#[test]
fn constant_dimension_contributes_nothing() {
    let mut x = sample();
    x.column_mut(1).fill(4.0);
    let mut clf = MultiAutoRegOD::with_config(config()).unwrap();
    clf.fit(x.view()).unwrap();
    assert_eq!(clf.decision_scores().unwrap().len(), 9);

    // the flat column's residuals are all zero and standardize to zero,
    // so the average is half of the first column's z-scores
    let models = clf.models().unwrap();
    assert!(models[1].decision_scores().unwrap().iter().all(|r| r.abs() < 1e-9));
    let first = models[0].decision_scores().unwrap().view().insert_axis(ndarray::Axis(1));
    let (z, _) = fit_transform(first).unwrap();
    for (combined, z0) in clf.decision_scores().unwrap().iter().zip(z.column(0)) {
        assert!((combined - z0 / 2.0).abs() < 1e-9);
    }

    let scored = clf.decision_function(x.view()).unwrap();
    assert_eq!(scored.values.len(), 9);
    assert!(scored.values.iter().all(|v| v.is_finite()));
}
