//! Residual diagnostic tests for time series models.
//!
//! Provides tests to validate that model residuals are white noise.

use crate::features::autocorrelation::acf;
use crate::utils::stats::{chi_squared_sf, mean, std_dev};
use std::fmt;
use tracing::warn;

/// Significance level used to classify Ljung-Box results.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Ljung-Box test result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from the chi-squared distribution with `lags` degrees of freedom
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
}

impl LjungBoxResult {
    /// Classify the result at the given significance level.
    pub fn verdict(&self, alpha: f64) -> AutocorrelationVerdict {
        if self.p_value > alpha {
            AutocorrelationVerdict::NoAutocorrelation
        } else {
            AutocorrelationVerdict::AutocorrelationDetected
        }
    }

    /// Returns true if we fail to reject the null (residuals are white noise).
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.verdict(alpha) == AutocorrelationVerdict::NoAutocorrelation
    }
}

/// Conclusion drawn from a Ljung-Box p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocorrelationVerdict {
    /// p-value above the significance level.
    NoAutocorrelation,
    /// p-value at or below the significance level.
    AutocorrelationDetected,
}

impl fmt::Display for AutocorrelationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutocorrelationVerdict::NoAutocorrelation => f.write_str("No autocorrelation"),
            AutocorrelationVerdict::AutocorrelationDetected => {
                f.write_str("Autocorrelation detected")
            }
        }
    }
}

/// Perform the Ljung-Box test for autocorrelation up to `lag`.
///
/// Tests the null hypothesis that residuals are independently distributed.
/// `Q = n (n + 2) sum_{k=1..lag} r_k^2 / (n - k)` is compared against a
/// chi-squared distribution with `lag` degrees of freedom. Zero-variance
/// input yields a statistic of 0 and a p-value of 1. `lag` is clamped to
/// `n - 1`; fewer than two residuals give NaN.
pub fn ljung_box(residuals: &[f64], lag: usize) -> LjungBoxResult {
    let n = residuals.len();
    if n < 2 || lag == 0 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: lag,
        };
    }
    let lag = lag.min(n - 1);

    let m = mean(residuals);
    if residuals.iter().all(|r| (r - m).abs() == 0.0) {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags: lag,
        };
    }

    let r = acf(residuals, lag);
    let q = (1..=lag)
        .map(|k| r[k] * r[k] / (n - k) as f64)
        .sum::<f64>()
        * n as f64
        * (n + 2) as f64;

    LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, lag),
        lags: lag,
    }
}

/// Ljung-Box outcome at one lag, as listed in a diagnostics report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LjungBoxLag {
    /// Lag tested
    pub lag: usize,
    /// Test statistic Q
    pub statistic: f64,
    /// P-value
    pub p_value: f64,
    /// Classification at [`DEFAULT_SIGNIFICANCE`]
    pub verdict: AutocorrelationVerdict,
}

/// Summary statistics and autocorrelation tests of a residual sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualDiagnostics {
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std: f64,
    /// Ljung-Box results, ascending by lag
    pub ljung_box: Vec<LjungBoxLag>,
}

impl ResidualDiagnostics {
    /// Whether every tested lag found no autocorrelation.
    pub fn is_white_noise(&self) -> bool {
        self.ljung_box
            .iter()
            .all(|lb| lb.verdict == AutocorrelationVerdict::NoAutocorrelation)
    }
}

impl fmt::Display for ResidualDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean: {:.4}, Std: {:.4}", self.mean, self.std)?;
        writeln!(f)?;
        write!(f, "Ljung-Box test (autocorrelation):")?;
        for lb in &self.ljung_box {
            write!(
                f,
                "\nLag {}: statistic={:.4}, p-value={:.4} -> {}",
                lb.lag, lb.statistic, lb.p_value, lb.verdict
            )?;
        }
        Ok(())
    }
}

/// Lags tested by [`diagnose_residuals`]: 10 and 20, clamped to `n - 1`.
pub fn diagnostic_lags(n: usize) -> Vec<usize> {
    if n < 3 {
        return Vec::new();
    }
    let mut lags = vec![10.min(n - 1), 20.min(n - 1)];
    lags.dedup();
    lags
}

/// Mean, standard deviation and Ljung-Box tests at lags 10 and 20.
///
/// Lags are clamped to `n - 1` and deduplicated. With fewer than three
/// residuals no test is run.
///
/// # Example
/// ```
/// use forecast_lab::validation::diagnose_residuals;
///
/// let residuals: Vec<f64> = (0..50).map(|i| ((i * 17 + 13) % 23) as f64 - 11.0).collect();
/// let report = diagnose_residuals(&residuals);
/// assert_eq!(report.ljung_box.len(), 2);
/// assert_eq!(report.ljung_box[1].lag, 20);
/// ```
pub fn diagnose_residuals(residuals: &[f64]) -> ResidualDiagnostics {
    let lags = diagnostic_lags(residuals.len());
    if lags.is_empty() {
        warn!(
            n = residuals.len(),
            "too few residuals for Ljung-Box; reporting moments only"
        );
    }

    let ljung_box = lags
        .into_iter()
        .map(|lag| {
            let result = ljung_box(residuals, lag);
            LjungBoxLag {
                lag: result.lags,
                statistic: result.statistic,
                p_value: result.p_value,
                verdict: result.verdict(DEFAULT_SIGNIFICANCE),
            }
        })
        .collect();

    ResidualDiagnostics {
        mean: mean(residuals),
        std: std_dev(residuals),
        ljung_box,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pseudo_noise(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
            .collect()
    }

    fn ar1(n: usize, phi: f64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut values = vec![0.0; n];
        for i in 1..n {
            values[i] = phi * values[i - 1] + rng.gen_range(-1.0..1.0);
        }
        values
    }

    #[test]
    fn ljung_box_matches_definition() {
        let residuals = vec![1.0, -0.5, 0.3, -1.2, 0.8, 0.1, -0.4, 0.9];
        let n = residuals.len() as f64;
        let m = residuals.iter().sum::<f64>() / n;
        let c: Vec<f64> = residuals.iter().map(|r| r - m).collect();
        let denom: f64 = c.iter().map(|x| x * x).sum();
        let r1: f64 = c.windows(2).map(|w| w[0] * w[1]).sum::<f64>() / denom;
        let r2: f64 = c.windows(3).map(|w| w[0] * w[2]).sum::<f64>() / denom;
        let expected = n * (n + 2.0) * (r1 * r1 / (n - 1.0) + r2 * r2 / (n - 2.0));

        let result = ljung_box(&residuals, 2);

        assert_relative_eq!(result.statistic, expected, epsilon = 1e-10);
        assert_relative_eq!(result.p_value, chi_squared_sf(expected, 2), epsilon = 1e-12);
        assert_eq!(result.lags, 2);
    }

    #[test]
    fn ljung_box_detects_ar1() {
        let result = ljung_box(&ar1(200, 0.8), 10);
        assert!(result.p_value < 0.01);
        assert_eq!(
            result.verdict(0.05),
            AutocorrelationVerdict::AutocorrelationDetected
        );
    }

    #[test]
    fn ljung_box_constant() {
        let result = ljung_box(&[1.0; 50], 5);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(result.is_white_noise(0.05));
    }

    #[test]
    fn ljung_box_clamps_lag() {
        let result = ljung_box(&[1.0, -1.0, 0.5, 0.2], 10);
        assert_eq!(result.lags, 3);
        assert!(result.statistic.is_finite());
        assert!(ljung_box(&[1.0], 5).statistic.is_nan());
    }

    #[test]
    fn verdict_uses_strict_threshold() {
        let result = LjungBoxResult {
            statistic: 5.0,
            p_value: 0.05,
            lags: 10,
        };
        assert_eq!(
            result.verdict(0.05),
            AutocorrelationVerdict::AutocorrelationDetected
        );
        assert!(result.is_white_noise(0.01));
    }

    #[test]
    fn diagnostic_lags_are_clamped_and_deduplicated() {
        assert_eq!(diagnostic_lags(100), vec![10, 20]);
        assert_eq!(diagnostic_lags(15), vec![10, 14]);
        assert_eq!(diagnostic_lags(8), vec![7]);
        assert!(diagnostic_lags(2).is_empty());
    }

    #[test]
    fn diagnose_residuals_reports_moments() {
        let residuals = pseudo_noise(100);
        let report = diagnose_residuals(&residuals);

        assert_relative_eq!(report.mean, mean(&residuals), epsilon = 1e-12);
        assert_relative_eq!(report.std, std_dev(&residuals), epsilon = 1e-12);
        assert_eq!(report.ljung_box.len(), 2);
        assert_eq!(report.ljung_box[0].lag, 10);
        assert!(report
            .ljung_box
            .iter()
            .all(|lb| lb.p_value >= 0.0 && lb.p_value <= 1.0));
    }

    #[test]
    fn diagnose_residuals_short_input() {
        let report = diagnose_residuals(&[0.5, -0.5]);
        assert!(report.ljung_box.is_empty());
        assert!(report.is_white_noise());

        let report = diagnose_residuals(&[]);
        assert!(report.mean.is_nan());
    }

    #[test]
    fn diagnose_residuals_all_zero() {
        let report = diagnose_residuals(&[0.0; 30]);
        assert_eq!(report.mean, 0.0);
        assert_eq!(report.ljung_box.len(), 2);
        assert!(report
            .ljung_box
            .iter()
            .all(|lb| lb.verdict == AutocorrelationVerdict::NoAutocorrelation));
        assert!(report.is_white_noise());
    }

    #[test]
    fn diagnostics_report_layout() {
        let report = ResidualDiagnostics {
            mean: 0.01234,
            std: 1.5,
            ljung_box: vec![LjungBoxLag {
                lag: 10,
                statistic: 12.3456,
                p_value: 0.2623,
                verdict: AutocorrelationVerdict::NoAutocorrelation,
            }],
        };

        assert_eq!(
            report.to_string(),
            "Mean: 0.0123, Std: 1.5000\n\nLjung-Box test (autocorrelation):\n\
             Lag 10: statistic=12.3456, p-value=0.2623 -> No autocorrelation"
        );
    }
}
