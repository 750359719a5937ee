//! Core data structures for time series analysis.

mod forecast;
mod time_series;

pub use forecast::{Forecast, StepForecast};
pub use time_series::{SeriesInput, TimeSeries};
