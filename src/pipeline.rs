//! End-to-end ARIMA evaluation.
//!
//! A [`Pipeline`] runs six stages in order, each gating the next:
//!
//! 1. split the series into training and test segments,
//! 2. fit the model on the training segment,
//! 3. evaluate in-sample predictions and residuals,
//! 4. roll one-step forecasts over the test segment,
//! 5. compute error metrics,
//! 6. diagnose the out-of-sample residuals.
//!
//! The first failing stage aborts the run and its error is returned as is.
//!
//! # Example
//!
//! ```
//! use forecast_lab::core::TimeSeries;
//! use forecast_lab::pipeline::{Pipeline, PipelineConfig};
//! use chrono::{TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let values: Vec<f64> = (0..100).map(|i| 5.0 + 0.8 * i as f64 + (i as f64 * 1.3).sin()).collect();
//! let series = TimeSeries::daily(start, values).unwrap();
//!
//! let config = PipelineConfig::default().with_order((1, 1, 0));
//! let summary = Pipeline::new(config).run(series).unwrap();
//!
//! assert_eq!(summary.forecast.horizon(), 20);
//! assert!(summary.metrics.mae >= 0.0);
//! ```

use crate::core::{Forecast, SeriesInput, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{ArimaConfig, ArimaModel, ArimaOrder, SeasonalOrder};
use crate::plot::{PlotRequest, PlotSink};
use crate::utils::{calculate_metrics, split_series, ErrorMetrics, SplitConfig};
use crate::validation::{diagnose_residuals, ResidualDiagnostics};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, info_span};

/// Settings for a [`Pipeline`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Name shown in logs and reports.
    pub name: String,
    /// Non-seasonal order.
    pub order: ArimaOrder,
    /// Seasonal order.
    pub seasonal_order: SeasonalOrder,
    /// Significance level of the forecast intervals.
    pub alpha: f64,
    /// How [`Pipeline::run`] splits its input.
    pub split: SplitConfig,
    /// Estimation settings; its orders are replaced by `order` and `seasonal_order`.
    pub arima: ArimaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "ARIMA".to_string(),
            order: ArimaOrder::new(1, 0, 0),
            seasonal_order: SeasonalOrder::none(),
            alpha: 0.05,
            split: SplitConfig::default(),
            arima: ArimaConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the run name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the non-seasonal order.
    pub fn with_order(mut self, order: impl Into<ArimaOrder>) -> Self {
        self.order = order.into();
        self
    }

    /// Set the seasonal order.
    pub fn with_seasonal_order(mut self, seasonal_order: impl Into<SeasonalOrder>) -> Self {
        self.seasonal_order = seasonal_order.into();
        self
    }

    /// Set the interval significance level.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the split configuration.
    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    /// Set the estimation settings.
    pub fn with_arima(mut self, arima: ArimaConfig) -> Self {
        self.arima = arima;
        self
    }

    fn model_config(&self) -> ArimaConfig {
        self.arima
            .clone()
            .with_order(self.order)
            .with_seasonal_order(self.seasonal_order)
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Train/test partitioning (skipped by `run_split`).
    Split,
    /// Model estimation on the training segment.
    Fit,
    /// One-step predictions and residuals over the training segment.
    InSample,
    /// Rolling one-step forecasts over the test segment.
    OutOfSample,
    /// MAE, MSE and MAPE of the rolling forecasts.
    Metrics,
    /// Ljung-Box checks of both residual series.
    Diagnostics,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Split => "split",
            Stage::Fit => "fit",
            Stage::InSample => "in-sample evaluation",
            Stage::OutOfSample => "out-of-sample forecast",
            Stage::Metrics => "metrics",
            Stage::Diagnostics => "out-of-sample diagnostics",
        };
        f.write_str(name)
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Run name.
    pub name: String,
    /// The model after absorbing every test observation.
    pub model: ArimaModel,
    /// Out-of-sample error metrics.
    pub metrics: ErrorMetrics,
    /// In-sample one-step predictions; NaN during the warm-up.
    pub fitted: Vec<f64>,
    /// In-sample residuals beyond the warm-up offset.
    pub residuals_in_sample: TimeSeries,
    /// Test observations minus their one-step forecasts.
    pub residuals_out_of_sample: TimeSeries,
    /// One-step forecasts over the test segment.
    pub forecast: Forecast,
    /// Diagnostics of the in-sample residuals.
    pub in_sample_diagnostics: ResidualDiagnostics,
    /// Diagnostics of the out-of-sample residuals.
    pub out_of_sample_diagnostics: ResidualDiagnostics,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl PipelineSummary {
    /// Run duration in minutes.
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(80);
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{} with order={} seasonal_order={}",
            self.name,
            self.model.order(),
            self.model.seasonal_order()
        )?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "{}", self.metrics)?;
        writeln!(f)?;
        writeln!(f, "In-sample residuals")?;
        writeln!(f, "{}", self.in_sample_diagnostics)?;
        writeln!(f)?;
        writeln!(f, "Out-of-sample residuals")?;
        writeln!(f, "{}", self.out_of_sample_diagnostics)?;
        writeln!(f)?;
        writeln!(f, "Total execution time: {:.2} minutes", self.elapsed_minutes())?;
        write!(f, "{}", rule)
    }
}

/// Orchestrates split, fit, evaluation and diagnostics for one configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split `series` and run every stage without rendering.
    pub fn run(&self, series: impl Into<SeriesInput>) -> Result<PipelineSummary> {
        self.execute_full(series.into(), None)
    }

    /// Like [`run`](Self::run), handing stage outputs to `sink`.
    pub fn run_with_sink(
        &self,
        series: impl Into<SeriesInput>,
        sink: &mut dyn PlotSink,
    ) -> Result<PipelineSummary> {
        self.execute_full(series.into(), Some(sink))
    }

    /// Run from the fit stage on pre-split data.
    pub fn run_split(&self, train: &TimeSeries, test: &TimeSeries) -> Result<PipelineSummary> {
        self.execute(train, test, None, Instant::now())
    }

    /// Like [`run_split`](Self::run_split), handing stage outputs to `sink`.
    pub fn run_split_with_sink(
        &self,
        train: &TimeSeries,
        test: &TimeSeries,
        sink: &mut dyn PlotSink,
    ) -> Result<PipelineSummary> {
        self.execute(train, test, Some(sink), Instant::now())
    }

    fn execute_full(
        &self,
        input: SeriesInput,
        sink: Option<&mut dyn PlotSink>,
    ) -> Result<PipelineSummary> {
        let started = Instant::now();
        info!(name = %self.config.name, stage = %Stage::Split, "stage started");
        let (train, test) = split_series(input, &self.config.split)?.into_train_test();

        self.execute(&train, &test, sink, started)
    }

    fn execute(
        &self,
        train: &TimeSeries,
        test: &TimeSeries,
        mut sink: Option<&mut dyn PlotSink>,
        started: Instant,
    ) -> Result<PipelineSummary> {
        let config = &self.config;
        if !(config.alpha > 0.0 && config.alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                config.alpha
            )));
        }
        let _span = info_span!("pipeline", name = %config.name).entered();
        info!(
            order = %config.order,
            seasonal_order = %config.seasonal_order,
            train = train.len(),
            test = test.len(),
            "running pipeline"
        );

        info!(stage = %Stage::Fit, "stage started");
        let mut model = ArimaModel::fit_with_config(train, &config.model_config())?;

        info!(stage = %Stage::InSample, "stage started");
        let fitted = model.predict_in_sample();
        let residuals_in_sample = model.residuals_in_sample_series()?;
        let in_sample_diagnostics = diagnose_residuals(residuals_in_sample.primary_values());
        info!(
            mean = in_sample_diagnostics.mean,
            std = in_sample_diagnostics.std,
            white_noise = in_sample_diagnostics.is_white_noise(),
            "in-sample residuals"
        );
        if let Some(sink) = sink.as_deref_mut() {
            sink.render(PlotRequest::InSample {
                train,
                fitted: &fitted,
                offset: model.warmup_offset(),
                order: model.order(),
            })?;
            sink.render(PlotRequest::Residuals {
                stage: "in-sample",
                residuals: &residuals_in_sample,
            })?;
        }

        info!(stage = %Stage::OutOfSample, horizon = test.len(), "stage started");
        let forecast = model.rolling_forecast(test, config.alpha)?;
        if let Some(sink) = sink.as_deref_mut() {
            sink.render(PlotRequest::Forecast {
                test,
                forecast: &forecast,
            })?;
        }

        info!(stage = %Stage::Metrics, "stage started");
        let metrics = calculate_metrics(test.primary_values(), forecast.point())?;
        info!(
            mae = metrics.mae,
            mse = metrics.mse,
            mape = metrics.mape,
            "out-of-sample metrics"
        );

        info!(stage = %Stage::Diagnostics, "stage started");
        let residuals_out_of_sample = ArimaModel::residuals_out_of_sample(test, &forecast)?;
        let out_of_sample_diagnostics =
            diagnose_residuals(residuals_out_of_sample.primary_values());
        if let Some(sink) = sink.as_deref_mut() {
            sink.render(PlotRequest::Residuals {
                stage: "out-of-sample",
                residuals: &residuals_out_of_sample,
            })?;
        }

        let elapsed = started.elapsed();
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            "pipeline finished"
        );

        Ok(PipelineSummary {
            name: config.name.clone(),
            model,
            metrics,
            fitted,
            residuals_in_sample,
            residuals_out_of_sample,
            forecast,
            in_sample_diagnostics,
            out_of_sample_diagnostics,
            elapsed,
        })
    }
}
