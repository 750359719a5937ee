//! Sample autocorrelation and partial autocorrelation functions.
//!
//! Both functions use the biased (divide by `n`) autocovariance estimator,
//! which keeps the implied autocorrelation matrix positive semi-definite.

use crate::utils::stats::{mean, quantile_normal};

/// Autocorrelation values with confidence bounds for lags `0..=nlags`.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlogram {
    /// Lags, starting at 0
    pub lags: Vec<usize>,
    /// Correlation at each lag
    pub values: Vec<f64>,
    /// Half-width of the confidence band at each lag
    pub half_widths: Vec<f64>,
    /// Significance level of the band
    pub alpha: f64,
}

impl Correlogram {
    /// Lower confidence bound, centred on the estimate.
    pub fn lower(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.half_widths)
            .map(|(v, h)| v - h)
            .collect()
    }

    /// Upper confidence bound, centred on the estimate.
    pub fn upper(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.half_widths)
            .map(|(v, h)| v + h)
            .collect()
    }

    /// Lags (excluding 0) whose value lies outside the band around zero.
    pub fn significant_lags(&self) -> Vec<usize> {
        self.lags
            .iter()
            .zip(self.values.iter().zip(&self.half_widths))
            .filter(|(lag, (v, h))| **lag > 0 && v.abs() > **h)
            .map(|(lag, _)| *lag)
            .collect()
    }
}

/// Number of lags shown by default: `min(20, n - 1)`.
pub fn default_lags(n: usize) -> usize {
    20.min(n.saturating_sub(1))
}

/// Sample autocorrelation for lags `0..=nlags`.
///
/// `nlags` is clamped to `n - 1`. A constant series has zero
/// autocorrelation beyond lag 0.
///
/// # Example
/// ```
/// use forecast_lab::features::autocorrelation::acf;
///
/// let r = acf(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
/// assert_eq!(r.len(), 3);
/// assert!((r[0] - 1.0).abs() < 1e-12);
/// assert!((r[1] - 0.4).abs() < 1e-12);
/// ```
pub fn acf(series: &[f64], nlags: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let nlags = nlags.min(n - 1);

    let m = mean(series);
    let centered: Vec<f64> = series.iter().map(|x| x - m).collect();
    let c0: f64 = centered.iter().map(|x| x * x).sum();

    let mut result = Vec::with_capacity(nlags + 1);
    result.push(1.0);
    for k in 1..=nlags {
        if c0 < 1e-12 {
            result.push(0.0);
            continue;
        }
        let ck: f64 = centered
            .iter()
            .skip(k)
            .zip(&centered)
            .map(|(a, b)| a * b)
            .sum();
        result.push(ck / c0);
    }
    result
}

/// Autocorrelation with Bartlett confidence bands.
///
/// The variance of `r_k` is `(1 + 2 sum_{j<k} r_j^2) / n`.
pub fn acf_with_confint(series: &[f64], nlags: usize, alpha: f64) -> Correlogram {
    let values = acf(series, nlags);
    let n = series.len().max(1) as f64;
    let z = quantile_normal(1.0 - alpha / 2.0);

    let mut half_widths = Vec::with_capacity(values.len());
    let mut cumulative = 0.0;
    for (k, r) in values.iter().enumerate() {
        let width = match k {
            0 => 0.0,
            _ => z * ((1.0 + 2.0 * cumulative) / n).sqrt(),
        };
        half_widths.push(width);
        if k > 0 {
            cumulative += r * r;
        }
    }

    Correlogram {
        lags: (0..values.len()).collect(),
        values,
        half_widths,
        alpha,
    }
}

/// Partial autocorrelation for lags `0..=nlags` by the Durbin-Levinson recursion.
///
/// Solves the Yule-Walker equations on the biased autocorrelations. `nlags`
/// is clamped to `n / 2 - 1`, beyond which the estimates are unreliable.
pub fn pacf(series: &[f64], nlags: usize) -> Vec<f64> {
    let n = series.len();
    if n < 2 {
        return if n == 1 { vec![1.0] } else { Vec::new() };
    }
    let nlags = nlags.min((n / 2).saturating_sub(1)).max(1).min(n - 1);
    let r = acf(series, nlags);

    let mut result = vec![1.0, r[1]];
    let mut phi = vec![r[1]];

    for k in 2..=nlags {
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let denom = 1.0 - (1..k).map(|j| phi[j - 1] * r[j]).sum::<f64>();

        if denom.abs() < 1e-10 {
            result.push(0.0);
            phi.push(0.0);
            continue;
        }

        let phi_kk = num / denom;
        let mut next: Vec<f64> = (1..k)
            .map(|j| phi[j - 1] - phi_kk * phi[k - j - 1])
            .collect();
        next.push(phi_kk);
        phi = next;
        result.push(phi_kk);
    }

    result
}

/// Partial autocorrelation with `z / sqrt(n)` confidence bands.
pub fn pacf_with_confint(series: &[f64], nlags: usize, alpha: f64) -> Correlogram {
    let values = pacf(series, nlags);
    let n = series.len().max(1) as f64;
    let width = quantile_normal(1.0 - alpha / 2.0) / n.sqrt();
    let half_widths = (0..values.len())
        .map(|k| if k == 0 { 0.0 } else { width })
        .collect();

    Correlogram {
        lags: (0..values.len()).collect(),
        values,
        half_widths,
        alpha,
    }
}
