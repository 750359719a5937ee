//! Moving-window smoothers and the residuals they leave behind.
//!
//! Smoothing a series and subtracting the result is a quick way to remove
//! trend before looking at autocorrelation or stationarity.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use tracing::debug;

/// Compute rolling mean with a specified window size.
///
/// Only complete windows produce a value; the remaining positions are NaN.
/// A trailing window ends at the current observation. A centred window
/// covers `[i - window / 2, i + (window - 1) / 2]`, so even windows lean
/// towards the past.
///
/// # Arguments
/// * `series` - Input time series
/// * `window` - Window size
/// * `center` - If true, the window is centred on each point
pub fn rolling_mean(series: &[f64], window: usize, center: bool) -> Vec<f64> {
    let n = series.len();
    if n == 0 || window == 0 {
        return vec![f64::NAN; n];
    }

    let mut result = vec![f64::NAN; n];
    if window > n {
        return result;
    }

    // Trailing sums, written at the window's last index.
    let mut sum: f64 = series[..window].iter().sum();
    let offset = if center { (window - 1) / 2 } else { 0 };
    let w = window as f64;

    result[window - 1 - offset] = sum / w;
    for end in window..n {
        sum += series[end] - series[end - window];
        result[end - offset] = sum / w;
    }

    result
}

/// Compute exponentially weighted moving average (EWMA) with adjusted weights.
///
/// `y_t = sum_i (1 - alpha)^i x_{t-i} / sum_i (1 - alpha)^i`, so early values
/// are not pulled towards the first observation. Missing observations keep
/// their weight slot but contribute nothing.
///
/// # Arguments
/// * `series` - Input time series
/// * `alpha` - Smoothing factor (0 < alpha <= 1)
///   - Higher alpha = more weight on recent values
///   - alpha = 2/(span+1) when smoothing by span
pub fn ewm_mean(series: &[f64], alpha: f64) -> Vec<f64> {
    let decay = 1.0 - alpha.clamp(0.0, 1.0);
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    series
        .iter()
        .map(|&x| {
            numerator *= decay;
            denominator *= decay;
            if x.is_finite() {
                numerator += x;
                denominator += 1.0;
            }
            if denominator > 0.0 {
                numerator / denominator
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// A smoothed series and what is left after subtracting it.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingResidual {
    /// Smoothed values at the observations where the smoother is defined
    pub smoothed: TimeSeries,
    /// `observed - smoothed` on the same index
    pub residual: TimeSeries,
}

impl SmoothingResidual {
    fn from_smoothed(ts: &TimeSeries, smoothed: Vec<f64>) -> Result<Self> {
        let observed = ts.primary_values();
        let residual: Vec<f64> = observed
            .iter()
            .zip(&smoothed)
            .map(|(x, s)| x - s)
            .collect();

        let defined: Vec<usize> = (0..observed.len())
            .filter(|&i| smoothed[i].is_finite() && residual[i].is_finite())
            .collect();
        let timestamps: Vec<_> = defined.iter().map(|&i| ts.timestamps()[i]).collect();

        debug!(
            n = observed.len(),
            kept = defined.len(),
            "dropped undefined smoothing points"
        );

        Ok(Self {
            smoothed: TimeSeries::univariate(
                timestamps.clone(),
                defined.iter().map(|&i| smoothed[i]).collect(),
            )?,
            residual: TimeSeries::univariate(
                timestamps,
                defined.iter().map(|&i| residual[i]).collect(),
            )?,
        })
    }
}

/// Residual of the series after removing a rolling mean.
///
/// Fails with `InvalidParameter` when `window` is zero and
/// `InsufficientData` when the series is shorter than one window.
pub fn moving_average_residual(
    ts: &TimeSeries,
    window: usize,
    center: bool,
) -> Result<SmoothingResidual> {
    if window == 0 {
        return Err(ForecastError::InvalidParameter(
            "window must be positive".to_string(),
        ));
    }
    if ts.len() < window {
        return Err(ForecastError::InsufficientData {
            needed: window,
            got: ts.len(),
        });
    }

    let smoothed = rolling_mean(ts.primary_values(), window, center);
    SmoothingResidual::from_smoothed(ts, smoothed)
}

/// Residual of the series after removing an adjusted EWMA.
pub fn ewm_residual(ts: &TimeSeries, alpha: f64) -> Result<SmoothingResidual> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "alpha must be in (0, 1], got {}",
            alpha
        )));
    }
    if ts.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let smoothed = ewm_mean(ts.primary_values(), alpha);
    SmoothingResidual::from_smoothed(ts, smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn daily(values: Vec<f64>) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        TimeSeries::daily(start, values).unwrap()
    }

    // ==================== rolling_mean ====================

    #[test]
    fn rolling_mean_basic() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&series, 3, false);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_relative_eq!(result[2], 2.0, epsilon = 1e-10); // (1+2+3)/3
        assert_relative_eq!(result[3], 3.0, epsilon = 1e-10); // (2+3+4)/3
        assert_relative_eq!(result[4], 4.0, epsilon = 1e-10); // (3+4+5)/3
    }

    #[test]
    fn rolling_mean_window_1() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&series, 1, false);

        for (i, &x) in series.iter().enumerate() {
            assert_relative_eq!(result[i], x, epsilon = 1e-10);
        }
    }

    #[test]
    fn rolling_mean_empty_and_oversized() {
        assert!(rolling_mean(&[], 3, false).is_empty());
        assert!(rolling_mean(&[1.0, 2.0], 3, true)
            .iter()
            .all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_mean_centered() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = rolling_mean(&series, 3, true);

        assert!(result[0].is_nan());
        assert_relative_eq!(result[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(result[2], 3.0, epsilon = 1e-10);
        assert_relative_eq!(result[3], 4.0, epsilon = 1e-10);
        assert!(result[4].is_nan());
    }

    #[test]
    fn rolling_mean_centered_even_window() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let result = rolling_mean(&series, 4, true);

        // Window at i covers [i-2, i+1].
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_relative_eq!(result[2], 2.5, epsilon = 1e-10);
        assert_relative_eq!(result[3], 3.5, epsilon = 1e-10);
        assert_relative_eq!(result[4], 4.5, epsilon = 1e-10);
        assert!(result[5].is_nan());
    }

    // ==================== ewm_mean ====================

    #[test]
    fn ewm_mean_uses_adjusted_weights() {
        let series = vec![1.0, 2.0, 3.0];
        let result = ewm_mean(&series, 0.5);

        assert_relative_eq!(result[0], 1.0, epsilon = 1e-10);
        // (2 + 0.5 * 1) / 1.5
        assert_relative_eq!(result[1], 2.5 / 1.5, epsilon = 1e-10);
        // (3 + 0.5 * 2 + 0.25 * 1) / 1.75
        assert_relative_eq!(result[2], 4.25 / 1.75, epsilon = 1e-10);
    }

    #[test]
    fn ewm_mean_alpha_1() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ewm_mean(&series, 1.0);

        for (i, &x) in series.iter().enumerate() {
            assert_relative_eq!(result[i], x, epsilon = 1e-10);
        }
    }

    #[test]
    fn ewm_mean_skips_missing() {
        let result = ewm_mean(&[f64::NAN, 2.0, f64::NAN, 4.0], 0.5);

        assert!(result[0].is_nan());
        assert_relative_eq!(result[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(result[2], 2.0, epsilon = 1e-10);
        // (4 + 0.25 * 2) / 1.25
        assert_relative_eq!(result[3], 4.5 / 1.25, epsilon = 1e-10);
    }

    #[test]
    fn ewm_mean_empty() {
        assert!(ewm_mean(&[], 0.5).is_empty());
    }

    // ==================== residuals ====================

    #[test]
    fn moving_average_residual_drops_leading_points() {
        let ts = daily(vec![1.0, 2.0, 4.0, 7.0, 11.0]);
        let result = moving_average_residual(&ts, 3, false).unwrap();

        assert_eq!(result.smoothed.len(), 3);
        assert_eq!(result.residual.timestamps(), &ts.timestamps()[2..]);
        assert_relative_eq!(result.smoothed.primary_values()[0], 7.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(result.residual.primary_values()[0], 4.0 - 7.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn moving_average_residual_removes_linear_trend() {
        let ts = daily((0..30).map(|i| 2.0 * i as f64 + 5.0).collect());
        let result = moving_average_residual(&ts, 5, true).unwrap();

        assert_eq!(result.residual.len(), 26);
        for r in result.residual.primary_values() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn moving_average_residual_rejects_bad_window() {
        let ts = daily(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            moving_average_residual(&ts, 0, false),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            moving_average_residual(&ts, 4, false),
            Err(ForecastError::InsufficientData { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn ewm_residual_keeps_every_point() {
        let ts = daily(vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0]);
        let result = ewm_residual(&ts, 0.3).unwrap();

        assert_eq!(result.smoothed.len(), ts.len());
        assert_relative_eq!(result.residual.primary_values()[0], 0.0);
        let smoothed = ewm_mean(ts.primary_values(), 0.3);
        assert_relative_eq!(result.smoothed.primary_values()[5], smoothed[5]);
    }

    #[test]
    fn ewm_residual_rejects_bad_alpha() {
        let ts = daily(vec![1.0, 2.0]);
        for alpha in [0.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                ewm_residual(&ts, alpha),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
        assert!(ewm_residual(&ts, 1.0).is_ok());
    }
}
