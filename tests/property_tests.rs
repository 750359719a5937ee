//! Property-based tests for splitting, forecasting and diagnostics.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated time series data.

use chrono::{Duration, TimeZone, Utc};
use forecast_lab::core::{SeriesInput, TimeSeries};
use forecast_lab::features::acf;
use forecast_lab::models::{ArimaConfig, ArimaModel, UpdatePolicy};
use forecast_lab::transform::{ewm_mean, rolling_mean};
use forecast_lab::utils::{calculate_metrics, split_series, SplitConfig};
use forecast_lab::validation::ljung_box;
use proptest::prelude::*;

/// Create a TimeSeries from a vector of values.
fn make_ts(values: &[f64]) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..values.len())
        .map(|i| base + Duration::hours(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values.to_vec()).unwrap()
}

/// Strategy for generating valid time series values.
/// Adds small variation to avoid all-constant series.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Strategy for generating a noisy linear trend.
fn trending_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (
            0.0..100.0_f64,
            0.1..2.0_f64,
            prop::collection::vec(-1.0..1.0_f64, len),
        )
            .prop_map(|(base, slope, noise)| {
                noise
                    .iter()
                    .enumerate()
                    .map(|(i, e)| base + slope * i as f64 + e)
                    .collect()
            })
    })
}

fn quiet_split(train_fraction: f64) -> SplitConfig {
    SplitConfig::train_test(train_fraction).with_verbose(false)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn split_preserves_order_and_length(
        values in valid_values_strategy(10, 200),
        train_fraction in 0.1..0.9_f64,
    ) {
        let ts = make_ts(&values);
        let n = ts.len();
        let split = split_series(SeriesInput::Series(ts.clone()), &quiet_split(train_fraction)).unwrap();

        let expected_train = (train_fraction * n as f64 + 1e-9).floor() as usize;
        prop_assert_eq!(split.train().len(), expected_train);
        prop_assert_eq!(split.total_len(), n);
        prop_assert_eq!(split.train().timestamps(), &ts.timestamps()[..expected_train]);
        prop_assert_eq!(split.test().primary_values(), &values[expected_train..]);
    }

    #[test]
    fn three_way_split_covers_series(
        values in valid_values_strategy(30, 200),
        train_fraction in 0.3..0.6_f64,
        validation_fraction in 0.1..0.3_f64,
    ) {
        let ts = make_ts(&values);
        let config = SplitConfig::train_validation_test(train_fraction, validation_fraction)
            .with_verbose(false);
        let split = split_series(ts.into(), &config).unwrap();

        let validation = split.validation().unwrap();
        prop_assert_eq!(split.total_len(), values.len());
        prop_assert!(split.train().end().unwrap() < validation.start().unwrap());
        prop_assert!(validation.end().unwrap() < split.test().start().unwrap());
    }

    #[test]
    fn metrics_are_non_negative_and_consistent(
        actual in prop::collection::vec(1.0..500.0_f64, 1..100),
        shift in -50.0..50.0_f64,
    ) {
        let predicted: Vec<f64> = actual.iter().map(|a| a + shift).collect();
        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        prop_assert!(metrics.mae >= 0.0);
        prop_assert!(metrics.mape >= 0.0);
        prop_assert!(metrics.mse + 1e-9 >= metrics.mae * metrics.mae);
        prop_assert!((metrics.mae - shift.abs()).abs() < 1e-9);

        let perfect = calculate_metrics(&actual, &actual).unwrap();
        prop_assert_eq!(perfect.mae, 0.0);
        prop_assert_eq!(perfect.mse, 0.0);
        prop_assert_eq!(perfect.mape, 0.0);
    }

    #[test]
    fn ljung_box_p_value_is_a_probability(values in valid_values_strategy(5, 150), lag in 1usize..25) {
        let result = ljung_box(&values, lag);
        prop_assert!(result.statistic >= 0.0);
        prop_assert!((0.0..=1.0).contains(&result.p_value));
        prop_assert!(result.lags <= values.len() - 1);
    }

    #[test]
    fn acf_is_bounded(values in valid_values_strategy(5, 150)) {
        for r in acf(&values, 20) {
            prop_assert!(r.abs() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn smoothers_stay_within_range(values in valid_values_strategy(5, 100), window in 1usize..10, alpha in 0.01..1.0_f64) {
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        for v in rolling_mean(&values, window, false).into_iter().filter(|v| v.is_finite()) {
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
        for v in ewm_mean(&values, alpha) {
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn rolling_forecast_covers_test_segment(values in trending_values_strategy(40, 90)) {
        let ts = make_ts(&values);
        let (train, test) = split_series(ts.into(), &quiet_split(0.75)).unwrap().into_train_test();

        let config = ArimaConfig::new((1, 1, 0), (0, 0, 0, 0))
            .with_update_policy(UpdatePolicy::Filter);
        let fitted = ArimaModel::fit_with_config(&train, &config);
        prop_assume!(fitted.is_ok());
        let mut model = fitted.unwrap();

        let forecast = model.rolling_forecast(&test, 0.05).unwrap();
        prop_assert_eq!(forecast.horizon(), test.len());
        prop_assert_eq!(forecast.timestamps(), test.timestamps());
        for i in 0..forecast.horizon() {
            let step = forecast.step(i).unwrap();
            prop_assert!(step.lower <= step.point && step.point <= step.upper);
        }
        prop_assert_eq!(model.n_train(), train.len());

        let residuals = ArimaModel::residuals_out_of_sample(&test, &forecast).unwrap();
        prop_assert_eq!(residuals.len(), test.len());
    }
}
