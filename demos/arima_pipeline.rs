//! Walk through a complete ARIMA evaluation on a synthetic monthly series.
//!
//! Run with: cargo run --example arima_pipeline
//! Set RUST_LOG=forecast_lab=debug to see every one-step forecast.

use chrono::{TimeZone, Utc};
use forecast_lab::features::default_lags;
use forecast_lab::plot::{
    plot_acf_pacf, plot_annual_trend, plot_series, plot_smoothing_residual,
    plot_train_test_split, PlotStyle, SvgPlotSink,
};
use forecast_lab::prelude::*;
use forecast_lab::transform::{ewm_residual, moving_average_residual};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== forecast-lab ARIMA pipeline ===\n");

    // 1. Ten years of monthly data with trend and yearly seasonality
    let timestamps: Vec<_> = (0..120)
        .map(|i| {
            Utc.with_ymd_and_hms(2014 + i / 12, (i % 12) as u32 + 1, 1, 0, 0, 0)
                .unwrap()
        })
        .collect();
    let values: Vec<f64> = (0..120)
        .map(|i| {
            200.0                                                        // base level
            + 1.5 * i as f64                                             // linear trend
            + 25.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin() // seasonal pattern
            + 4.0 * (i as f64 * 1.7).sin()                               // noise
        })
        .collect();
    let series = TimeSeries::univariate(timestamps, values)?
        .with_labels(vec!["Sales".to_string()])?;

    let out = std::env::temp_dir().join("forecast_lab_demo");
    std::fs::create_dir_all(&out).map_err(|e| ForecastError::Render(e.to_string()))?;
    let style = PlotStyle::default().with_labels("Month", "Sales");

    plot_series(out.join("series.svg"), &series, "Monthly sales", &style)?;
    plot_annual_trend(out.join("annual_2020.svg"), &series, 2020, "Monthly sales", &style)?;

    // 2. Look at the structure before modelling
    println!("--- Stationarity ---");
    let outcome = adf_test(series.primary_values(), &AdfConfig::default())?;
    println!("{}\n", outcome);

    let values = series.primary_values();
    plot_acf_pacf(
        out.join("acf_pacf.svg"),
        values,
        default_lags(values.len()),
        0.05,
        "ACF and PACF",
        &style,
    )?;

    let smoothed = moving_average_residual(&series, 12, true)?;
    plot_smoothing_residual(out.join("moving_average.svg"), &series, &smoothed, "Moving average (12)", &style)?;
    let smoothed = ewm_residual(&series, 0.3)?;
    plot_smoothing_residual(out.join("ewm.svg"), &series, &smoothed, "EWM (alpha=0.3)", &style)?;

    // 3. Split and show the segments
    let split = split_series(series.clone().into(), &SplitConfig::train_test(0.8))?;
    println!("{}\n", split);
    plot_train_test_split(out.join("split.svg"), &series, &split, "Sales", &style)?;

    // 4. Run the pipeline with a seasonal model
    let config = PipelineConfig::default()
        .with_name("SARIMA")
        .with_order((1, 0, 0))
        .with_seasonal_order((0, 1, 1, 12));
    let mut sink = SvgPlotSink::new(&out).with_prefix("sarima").with_style(style);
    let summary = Pipeline::new(config).run_with_sink(series, &mut sink)?;

    println!("{}", summary);
    println!("\nPlots written to {}", out.display());

    Ok(())
}
