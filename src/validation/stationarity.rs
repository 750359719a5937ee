//! Augmented Dickey-Fuller unit-root test.
//!
//! Lag selection, p-values and critical values follow the conventions of
//! the usual statistical packages: AIC search over a common sample,
//! MacKinnon (1994) approximate p-values and MacKinnon (2010) response
//! surface critical values.

use crate::error::{ForecastError, Result};
use crate::utils::ols::{ols_fit, OlsFit};
use crate::utils::stats::cdf_normal;
use std::fmt;
use tracing::{debug, info};

/// Deterministic terms included in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Regression {
    /// No constant, no trend.
    NoConstant,
    /// Constant only.
    #[default]
    Constant,
    /// Constant and linear trend.
    ConstantTrend,
}

impl Regression {
    fn num_trend_terms(self) -> usize {
        match self {
            Regression::NoConstant => 0,
            Regression::Constant => 1,
            Regression::ConstantTrend => 2,
        }
    }
}

/// Criterion used to choose the number of lagged differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Autolag {
    /// Minimise the Akaike information criterion.
    #[default]
    Aic,
    /// Minimise the Bayesian information criterion.
    Bic,
    /// Use `max_lag` lags without a search.
    Fixed,
}

/// Configuration for [`adf_test`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdfConfig {
    /// Deterministic terms.
    pub regression: Regression,
    /// Largest lag considered; `None` uses `ceil(12 * (n / 100)^(1/4))`.
    pub max_lag: Option<usize>,
    /// Lag selection rule.
    pub autolag: Autolag,
}

impl AdfConfig {
    /// Set the deterministic terms.
    pub fn with_regression(mut self, regression: Regression) -> Self {
        self.regression = regression;
        self
    }

    /// Set the largest lag considered.
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    /// Set the lag selection rule.
    pub fn with_autolag(mut self, autolag: Autolag) -> Self {
        self.autolag = autolag;
        self
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Result of an executed ADF test.
#[derive(Debug, Clone, PartialEq)]
pub struct AdfResult {
    /// t-statistic of the lagged level coefficient
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub p_value: f64,
    /// Number of lagged differences in the final regression
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
    /// Critical values for `nobs`
    pub critical_values: CriticalValues,
    /// Best information criterion value; `None` with a fixed lag
    pub ic_best: Option<f64>,
    /// Deterministic terms used
    pub regression: Regression,
}

impl AdfResult {
    /// Reject the unit root at significance `alpha`.
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

impl fmt::Display for AdfResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stationary(0.05) {
            writeln!(f, "Series is stationary (p-value={:.4})", self.p_value)?;
        } else {
            writeln!(f, "Series is NOT stationary (p-value={:.4})", self.p_value)?;
        }
        writeln!(f, "ADF Statistic: {}", self.statistic)?;
        writeln!(f, "Critical Values:")?;
        writeln!(f, "\t1%: {:.3}", self.critical_values.cv_1pct)?;
        writeln!(f, "\t5%: {:.3}", self.critical_values.cv_5pct)?;
        write!(f, "\t10%: {:.3}", self.critical_values.cv_10pct)
    }
}

/// Outcome of [`adf_test`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdfOutcome {
    /// The test was not run.
    NotApplicable { reason: String },
    /// The test was run.
    Tested(AdfResult),
}

impl AdfOutcome {
    /// The test result, if one was computed.
    pub fn result(&self) -> Option<&AdfResult> {
        match self {
            AdfOutcome::NotApplicable { .. } => None,
            AdfOutcome::Tested(result) => Some(result),
        }
    }
}

impl fmt::Display for AdfOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdfOutcome::NotApplicable { reason } => write!(f, "{}", reason),
            AdfOutcome::Tested(result) => result.fmt(f),
        }
    }
}

/// Augmented Dickey-Fuller test for a unit root.
///
/// Tests the null hypothesis that the series has a unit root. NaN values
/// are dropped first; a series with at most one distinct value yields
/// [`AdfOutcome::NotApplicable`] without running a regression. So does an
/// exactly linear series: its differences are constant and the lagged
/// difference columns are collinear with the intercept.
///
/// # Example
/// ```
/// use forecast_lab::validation::{adf_test, AdfConfig, AdfOutcome};
///
/// let outcome = adf_test(&[3.0; 40], &AdfConfig::default()).unwrap();
/// assert!(matches!(outcome, AdfOutcome::NotApplicable { .. }));
/// ```
pub fn adf_test(series: &[f64], config: &AdfConfig) -> Result<AdfOutcome> {
    let x: Vec<f64> = series.iter().copied().filter(|v| !v.is_nan()).collect();

    let is_constant = x.first().map_or(true, |first| x.iter().all(|v| v == first));
    if is_constant {
        info!(n = x.len(), "constant series, ADF test not applicable");
        return Ok(AdfOutcome::NotApplicable {
            reason: "Constant series - ADF test not applicable.".into(),
        });
    }
    if x.iter().any(|v| v.is_infinite()) {
        return Err(ForecastError::MissingValues);
    }

    let n = x.len();
    let ntrend = config.regression.num_trend_terms();
    let lag_limit = (n / 2) as i64 - ntrend as i64 - 1;
    let max_lag = match config.max_lag {
        None => {
            if lag_limit < 0 {
                return Err(ForecastError::InsufficientData {
                    needed: 2 * (ntrend + 1),
                    got: n,
                });
            }
            let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as i64;
            schwert.min(lag_limit) as usize
        }
        Some(lag) => {
            if lag as i64 > lag_limit {
                return Err(ForecastError::InvalidParameter(format!(
                    "max_lag must be at most {} for {} observations, got {}",
                    lag_limit.max(0),
                    n,
                    lag
                )));
            }
            lag
        }
    };

    let xdiff: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let scale = x.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let is_linear = xdiff
        .iter()
        .all(|d| (d - xdiff[0]).abs() <= 1e-9 * scale);
    if is_linear {
        info!(n, "series with constant differences, ADF test not applicable");
        return Ok(AdfOutcome::NotApplicable {
            reason: "Linear series - ADF test not applicable.".into(),
        });
    }

    let (used_lag, ic_best) = match config.autolag {
        Autolag::Fixed => (max_lag, None),
        Autolag::Aic | Autolag::Bic => {
            let (lag, ic) = select_lag(&x, &xdiff, max_lag, config)?;
            (lag, Some(ic))
        }
    };

    let (y, columns) = design(&x, &xdiff, used_lag, used_lag, config.regression);
    let fit = ols_fit(&y, &columns)?;
    let statistic = fit
        .t_value(ntrend)
        .filter(|t| t.is_finite())
        .ok_or_else(|| {
            ForecastError::ComputationError("ADF regression has a degenerate fit".into())
        })?;

    let result = AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic, config.regression),
        used_lag,
        nobs: fit.nobs,
        critical_values: mackinnon_critical_values(config.regression, fit.nobs),
        ic_best,
        regression: config.regression,
    };

    info!(
        statistic = result.statistic,
        p_value = result.p_value,
        used_lag = result.used_lag,
        nobs = result.nobs,
        "ADF test"
    );

    Ok(AdfOutcome::Tested(result))
}

/// Regression `dy_t = [trend] + gamma y_{t-1} + sum_{i<=lags} beta_i dy_{t-i}`.
///
/// The sample starts after `sample_lag` differences so that regressions
/// with different `lags` can share one sample. Columns are ordered as
/// trend terms, lagged level, lagged differences.
fn design(
    x: &[f64],
    xdiff: &[f64],
    lags: usize,
    sample_lag: usize,
    regression: Regression,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let nobs = xdiff.len() - sample_lag;
    let mut columns = Vec::with_capacity(regression.num_trend_terms() + 1 + lags);

    if regression != Regression::NoConstant {
        columns.push(vec![1.0; nobs]);
    }
    if regression == Regression::ConstantTrend {
        columns.push((1..=nobs).map(|t| t as f64).collect());
    }
    columns.push(x[sample_lag..sample_lag + nobs].to_vec());
    for i in 1..=lags {
        columns.push(xdiff[sample_lag - i..sample_lag - i + nobs].to_vec());
    }

    (xdiff[sample_lag..].to_vec(), columns)
}

/// Choose the lag minimising the information criterion on a common sample.
fn select_lag(
    x: &[f64],
    xdiff: &[f64],
    max_lag: usize,
    config: &AdfConfig,
) -> Result<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;

    for lag in 0..=max_lag {
        let (y, columns) = design(x, xdiff, lag, max_lag, config.regression);
        let fit: OlsFit = ols_fit(&y, &columns)?;
        let ic = match config.autolag {
            Autolag::Bic => fit.bic(),
            _ => fit.aic(),
        };
        debug!(lag, ic, "ADF lag candidate");

        if best.map_or(true, |(_, best_ic)| ic < best_ic) {
            best = Some((lag, ic));
        }
    }

    best.ok_or_else(|| ForecastError::ComputationError("no ADF lag candidate".into()))
}

// MacKinnon (1994) approximate p-values for a single series.
const TAU_MAX: [f64; 3] = [f64::INFINITY, 2.74, 0.7];
const TAU_MIN: [f64; 3] = [-19.04, -18.83, -16.18];
const TAU_STAR: [f64; 3] = [-1.04, -1.61, -2.89];
const TAU_SMALLP: [[f64; 3]; 3] = [
    [0.6344, 1.2378, 0.032496],
    [2.1659, 1.4412, 0.038269],
    [3.2512, 1.6047, 0.049588],
];
const TAU_LARGEP: [[f64; 4]; 3] = [
    [0.4797, 0.93557, -0.06999, 0.033066],
    [1.7339, 0.93202, -0.12745, -0.010368],
    [2.5261, 0.61654, -0.37956, -0.060285],
];

// MacKinnon (2010) response surfaces, rows 1%, 5%, 10%.
const TAU_2010: [[[f64; 4]; 3]; 3] = [
    [
        [-2.56574, -2.2358, -3.627, 0.0],
        [-1.94100, -0.2686, -3.365, 31.223],
        [-1.61682, 0.2656, -2.714, 25.364],
    ],
    [
        [-3.43035, -6.5393, -16.786, -79.433],
        [-2.86154, -2.8903, -4.234, -40.040],
        [-2.56677, -1.5384, -2.809, 0.0],
    ],
    [
        [-3.95877, -9.0531, -28.428, -134.155],
        [-3.41049, -4.3904, -9.036, -45.374],
        [-3.12705, -2.5856, -3.925, -22.380],
    ],
];

fn table_index(regression: Regression) -> usize {
    match regression {
        Regression::NoConstant => 0,
        Regression::Constant => 1,
        Regression::ConstantTrend => 2,
    }
}

fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// MacKinnon approximate p-value of an ADF statistic.
pub fn mackinnon_p_value(statistic: f64, regression: Regression) -> f64 {
    let i = table_index(regression);
    if statistic > TAU_MAX[i] {
        return 1.0;
    }
    if statistic < TAU_MIN[i] {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR[i] {
        polyval(&TAU_SMALLP[i], statistic)
    } else {
        polyval(&TAU_LARGEP[i], statistic)
    };
    cdf_normal(z)
}

/// Finite-sample critical values at 1%, 5% and 10% for `nobs` observations.
pub fn mackinnon_critical_values(regression: Regression, nobs: usize) -> CriticalValues {
    let table = &TAU_2010[table_index(regression)];
    let inv = 1.0 / nobs.max(1) as f64;
    CriticalValues {
        cv_1pct: polyval(&table[0], inv),
        cv_5pct: polyval(&table[1], inv),
        cv_10pct: polyval(&table[2], inv),
    }
}
