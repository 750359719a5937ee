//! Forecast result structure for holding out-of-sample predictions.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// A single one-step-ahead forecast with its confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepForecast {
    /// Point forecast.
    pub point: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
}

impl StepForecast {
    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Whether `value` falls inside the interval (bounds included).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Out-of-sample forecasts aligned to the observations they predict.
///
/// Points and `(lower, upper)` pairs are parallel: entry `i` belongs to
/// `timestamps[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    timestamps: Vec<DateTime<Utc>>,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty forecast with room for `capacity` steps.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            point: Vec::with_capacity(capacity),
            lower: Vec::with_capacity(capacity),
            upper: Vec::with_capacity(capacity),
        }
    }

    /// Append a step forecast for `timestamp`.
    pub fn push(&mut self, timestamp: DateTime<Utc>, step: StepForecast) {
        self.timestamps.push(timestamp);
        self.point.push(step.point);
        self.lower.push(step.lower);
        self.upper.push(step.upper);
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Timestamps the forecasts are aligned to.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Point forecasts.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Iterate over `(lower, upper)` interval pairs.
    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lower.iter().copied().zip(self.upper.iter().copied())
    }

    /// Get the step forecast at `index`.
    pub fn step(&self, index: usize) -> Option<StepForecast> {
        Some(StepForecast {
            point: *self.point.get(index)?,
            lower: *self.lower.get(index)?,
            upper: *self.upper.get(index)?,
        })
    }

    /// Point forecasts as a time series.
    pub fn to_series(&self) -> Result<TimeSeries> {
        if self.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        TimeSeries::univariate(self.timestamps.clone(), self.point.clone())
    }
}
