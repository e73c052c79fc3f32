use autoreg_od::{
    combine, fit_transform, normalize_weights, transform, valid_window_count, window_bounds,
    CollectiveDetector, CombinationMethod, MultiAutoRegConfig, MultiAutoRegOD, OutlierError,
};
use ndarray::Array2;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn score_matrix() -> impl Strategy<Value = Array2<f64>> {
    (1usize..12, 1usize..6).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(-100.0f64..100.0, rows * cols).prop_map(move |flat| {
            Array2::from_shape_vec((rows, cols), flat).unwrap()
        })
    })
}

// arbitrary finite values, with some columns flattened, repeated or
// turned into exact ramps so the window regressions can be rank deficient
fn series_matrix() -> impl Strategy<Value = Array2<f64>> {
    (20usize..40, 1usize..4).prop_flat_map(|(rows, cols)| {
        (
            prop::collection::vec(-50.0f64..50.0, rows * cols),
            prop::collection::vec(0u8..4, cols),
        )
            .prop_map(move |(values, kinds)| {
                Array2::from_shape_fn((rows, cols), |(i, j)| match kinds[j] {
                    0 => values[j],
                    1 => 2.0 * i as f64 - values[j],
                    2 => values[j + cols * (i % 3)],
                    _ => values[i * cols + j],
                })
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn window_count_is_positive_and_bounds_fit(
        n in 2usize..500,
        window_size in 1usize..50,
        step_size in 1usize..20,
    ) {
        prop_assume!(n > window_size);
        let count = valid_window_count(n, window_size, step_size).unwrap();
        prop_assert!(count >= 1);
        let bounds = window_bounds(n, window_size, step_size).unwrap();
        prop_assert_eq!(bounds.len(), count);
        for (left, right) in bounds.pairs() {
            prop_assert_eq!(right - left, window_size);
        }
        // the target after the last window is still inside the series
        prop_assert!(*bounds.right_inds.last().unwrap() < n);
        // one more step would run past the end
        prop_assert!(bounds.right_inds.last().unwrap() + step_size >= n);
    }

    #[test]
    fn short_series_rejected(n in 0usize..30, extra in 0usize..10, step_size in 1usize..5) {
        let window_size = n + extra;
        prop_assume!(window_size >= 1);
        prop_assert!(matches!(
            valid_window_count(n, window_size, step_size),
            Err(OutlierError::InvalidWindowConfig(_))
        ));
    }

    #[test]
    fn normalized_weights_sum_to_dimension_count(
        weights in prop::collection::vec(0.001f64..1000.0, 1..20),
    ) {
        let d = weights.len();
        let normalized = normalize_weights(Some(&weights), d).unwrap();
        prop_assert!((normalized.sum() - d as f64).abs() < 1e-9 * d as f64);
    }

    #[test]
    fn maximization_and_median_match_row_statistics(m in score_matrix()) {
        let max = combine(m.view(), CombinationMethod::Maximization, None).unwrap();
        let median = combine(m.view(), CombinationMethod::Median, None).unwrap();
        for (i, row) in m.rows().into_iter().enumerate() {
            let mut sorted = row.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            prop_assert_eq!(max[i], *sorted.last().unwrap());
            let k = sorted.len();
            let expected = if k % 2 == 1 {
                sorted[k / 2]
            } else {
                (sorted[k / 2 - 1] + sorted[k / 2]) / 2.0
            };
            prop_assert_eq!(median[i], expected);
        }
    }

    #[test]
    fn standardization_state_reproduces_fit_transform(m in score_matrix()) {
        let (scaled, state) = fit_transform(m.view()).unwrap();
        let again = transform(m.view(), &state).unwrap();
        prop_assert_eq!(scaled, again);
    }

    #[test]
    fn scoring_is_idempotent(x in series_matrix(), window_size in 2usize..5) {
        let config = MultiAutoRegConfig::new(window_size)
            .with_contamination(0.1)
            .with_n_jobs(1);
        let mut clf = MultiAutoRegOD::with_config(config).unwrap();
        clf.fit(x.view()).unwrap();
        let first = clf.decision_function(x.view()).unwrap();
        let second = clf.decision_function(x.view()).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.values.len(), clf.valid_len().unwrap());
        let n = first.values.len();
        let min = first.values.iter().take(n - 1).copied().fold(f64::INFINITY, f64::min);
        prop_assert_eq!(first.values[n - 1], min);
    }
}
