//! # forecast-lab
//!
//! Evaluate ARIMA models on a single time series: split it chronologically,
//! fit on the training segment, roll one-step-ahead forecasts over the test
//! segment and check what is left over.
//!
//! Alongside the [`pipeline`] that runs those stages end to end, the crate
//! provides accuracy metrics, Ljung-Box residual diagnostics, the augmented
//! Dickey-Fuller stationarity test, ACF/PACF, smoothing residuals and SVG
//! plots of each result.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, SeriesInput, StepForecast, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{ArimaConfig, ArimaModel, ArimaOrder, SeasonalOrder, UpdatePolicy};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineSummary};
    pub use crate::utils::{calculate_metrics, split_series, ErrorMetrics, SplitConfig};
    pub use crate::validation::{adf_test, diagnose_residuals, AdfConfig, AdfOutcome};
}
