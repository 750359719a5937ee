//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};
use std::fmt;
use tracing::warn;

/// Error metrics between observed and forecast values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Mean Absolute Percentage Error, as a fraction (0.05 means 5%)
    pub mape: f64,
}

impl ErrorMetrics {
    /// Root of the mean squared error.
    pub fn rmse(&self) -> f64 {
        self.mse.sqrt()
    }

    /// Render the metrics under a custom heading.
    pub fn report(&self, title: &str) -> String {
        format!(
            "{}\nMAE: {:.4}\nMAPE: {:.4}\nMSE: {:.4}",
            title, self.mae, self.mape, self.mse
        )
    }
}

impl fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report("Out-of-sample evaluation"))
    }
}

/// Calculate MAE, MSE and MAPE between actual and predicted values.
///
/// MAPE divides by `max(|actual|, f64::EPSILON)`, so zeros in `actual`
/// produce very large but finite values instead of a division by zero.
///
/// # Example
/// ```
/// use forecast_lab::utils::calculate_metrics;
///
/// let metrics = calculate_metrics(&[100.0, 200.0], &[110.0, 190.0]).unwrap();
/// assert!((metrics.mae - 10.0).abs() < 1e-12);
/// assert!((metrics.mape - 0.075).abs() < 1e-12);
/// ```
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<ErrorMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    if actual.contains(&0.0) {
        warn!("actual values contain zeros; MAPE is dominated by those points");
    }

    Ok(ErrorMetrics {
        mae: mae(actual, predicted),
        mse: mse(actual, predicted),
        mape: mape(actual, predicted),
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MAPE (as a fraction) between two slices.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs() / a.abs().max(f64::EPSILON))
        .sum::<f64>()
        / actual.len() as f64
}
