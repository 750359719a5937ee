//! End-to-end runs of the evaluation pipeline on synthetic series.

use chrono::{TimeZone, Utc};
use forecast_lab::features::acf;
use forecast_lab::plot::SvgPlotSink;
use forecast_lab::prelude::*;
use forecast_lab::transform::moving_average_residual;
use forecast_lab::validation::{Autolag, Regression};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn daily(values: Vec<f64>) -> TimeSeries {
    let start = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
    TimeSeries::daily(start, values).unwrap()
}

fn linear_trend(n: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    daily(
        (0..n)
            .map(|i| 50.0 + 2.0 * i as f64 + rng.gen_range(-1.0..1.0))
            .collect(),
    )
}

fn quiet() -> PipelineConfig {
    PipelineConfig::default().with_split(SplitConfig::default().with_verbose(false))
}

#[test]
fn trend_series_end_to_end() {
    let series = linear_trend(100, 11);
    let summary = Pipeline::new(quiet().with_order((1, 1, 0)))
        .run(series.clone())
        .unwrap();

    assert!(summary.metrics.mae.is_finite() && summary.metrics.mae >= 0.0);
    assert!(summary.metrics.mse.is_finite() && summary.metrics.mse >= 0.0);
    assert!(summary.metrics.mape.is_finite() && summary.metrics.mape >= 0.0);
    assert_eq!(summary.residuals_out_of_sample.len(), 20);
    assert!(summary.residuals_in_sample.len() <= 80);
    assert!(summary.elapsed.as_secs_f64() >= 0.0);

    // One-step forecasts of a trend stay close to it.
    assert!(summary.metrics.mae < 2.0);
    assert!(summary.metrics.mape < 0.02);

    // Out-of-sample residuals equal observed minus forecast.
    let test = series.slice(80, 100).unwrap();
    for ((r, y), f) in summary
        .residuals_out_of_sample
        .primary_values()
        .iter()
        .zip(test.primary_values())
        .zip(summary.forecast.point())
    {
        assert!((r - (y - f)).abs() < 1e-12);
    }
}

#[test]
fn rolling_model_absorbs_the_test_segment() {
    let series = linear_trend(80, 3);
    let train = series.slice(0, 60).unwrap();
    let test = series.slice(60, 80).unwrap();

    let mut refit = ArimaModel::fit(&train, (1, 1, 0), (0, 0, 0, 0)).unwrap();
    let mut filter = ArimaModel::fit_with_config(
        &train,
        &ArimaConfig::new((1, 1, 0), (0, 0, 0, 0)).with_update_policy(UpdatePolicy::Filter),
    )
    .unwrap();
    let initial_ar = filter.ar_coefficients().to_vec();

    let a = refit.rolling_forecast(&test, 0.05).unwrap();
    let b = filter.rolling_forecast(&test, 0.05).unwrap();

    assert_eq!(a.horizon(), 20);
    assert_eq!(b.horizon(), 20);
    assert_eq!(filter.ar_coefficients(), initial_ar.as_slice());

    // The first step is forecast from the same state.
    assert!((a.point()[0] - b.point()[0]).abs() < 1e-12);

    // After absorbing the test segment the next forecast continues the trend.
    let next = refit.forecast_next(0.05).unwrap();
    let last = test.primary_values()[19];
    assert!(next.point > last - 3.0 && next.point < last + 7.0);
}

#[test]
fn seasonal_model_through_the_pipeline() {
    let mut rng = StdRng::seed_from_u64(5);
    let values: Vec<f64> = (0..120)
        .map(|i| {
            100.0
                + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + rng.gen_range(-1.0..1.0)
        })
        .collect();

    let config = quiet()
        .with_name("SARIMA")
        .with_order((1, 0, 0))
        .with_seasonal_order((0, 1, 0, 12));
    let summary = Pipeline::new(config).run(daily(values)).unwrap();

    assert_eq!(summary.forecast.horizon(), 24);
    assert_eq!(summary.model.warmup_offset(), 13);
    assert_eq!(summary.residuals_in_sample.len(), 96 - 13);
    assert!(summary.metrics.mae < 3.0);
}

#[test]
fn frame_input_must_have_one_column() {
    let base = daily((0..50).map(|i| i as f64).collect());
    let frame = TimeSeries::new(
        base.timestamps().to_vec(),
        vec![vec![1.0; 50], vec![2.0; 50]],
        vec!["a".into(), "b".into()],
    )
    .unwrap();

    let err = Pipeline::new(quiet())
        .run(SeriesInput::Frame(frame))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
}

#[test]
fn stationarity_and_smoothing_before_modelling() {
    let series = linear_trend(150, 21);

    let trend_aware = AdfConfig::default()
        .with_regression(Regression::ConstantTrend)
        .with_autolag(Autolag::Bic);
    let result = adf_test(series.primary_values(), &trend_aware).unwrap();
    assert!(result.result().unwrap().is_stationary(0.05));

    let detrended = moving_average_residual(&series, 7, true).unwrap();
    assert_eq!(detrended.residual.len(), 144);
    let r = acf(detrended.residual.primary_values(), 1);
    assert!(r[1].abs() < 0.5);

    let constant = adf_test(&[3.0; 40], &AdfConfig::default()).unwrap();
    assert!(matches!(constant, AdfOutcome::NotApplicable { .. }));
}

#[test]
fn svg_sink_writes_stage_plots() {
    let dir = std::env::temp_dir().join("forecast_lab_e2e_plots");
    std::fs::create_dir_all(&dir).unwrap();

    let mut sink = SvgPlotSink::new(&dir).with_prefix("trend");
    Pipeline::new(quiet().with_order((1, 1, 0)))
        .run_with_sink(linear_trend(100, 2), &mut sink)
        .unwrap();

    let names: Vec<String> = sink
        .written()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "trend_in_sample.svg",
            "trend_residuals_in_sample.svg",
            "trend_acf_in_sample.svg",
            "trend_forecast.svg",
            "trend_residuals_out_of_sample.svg",
            "trend_acf_out_of_sample.svg",
        ]
    );
    for path in sink.written() {
        assert!(path.exists());
    }
}
