//! Ordinary Least Squares regression with inference statistics.
//!
//! Used by the unit-root test, which needs t-statistics and information
//! criteria in addition to the fitted coefficients.

use crate::error::{ForecastError, Result};

/// Fitted OLS regression `y = X @ beta + e`.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Estimated coefficients, one per design column.
    pub params: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OlsFit {
    /// Number of estimated parameters.
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// t-statistic of each coefficient.
    pub fn t_values(&self) -> Vec<f64> {
        self.params
            .iter()
            .zip(&self.std_errors)
            .map(|(b, se)| b / se)
            .collect()
    }

    /// t-statistic of a single coefficient.
    pub fn t_value(&self, index: usize) -> Option<f64> {
        Some(self.params.get(index)? / self.std_errors.get(index)?)
    }

    /// Gaussian log-likelihood evaluated at the OLS estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every column as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + (self.nobs as f64).ln() * self.num_params() as f64
    }
}

/// Fit OLS given the design matrix as a list of columns.
///
/// Solves the normal equations with a Cholesky factorisation. The design
/// must have full column rank and more rows than columns.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OlsFit> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    for column in columns {
        if column.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: column.len(),
            });
        }
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        xty[i] = dot(&columns[i], y);
        for j in 0..=i {
            let v = dot(&columns[i], &columns[j]);
            xtx[i][j] = v;
            xtx[j][i] = v;
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("OLS design matrix is rank deficient".into())
    })?;
    let params = chol_solve(&chol, &xty);

    let ssr: f64 = (0..n)
        .map(|t| {
            let fitted: f64 = columns.iter().zip(&params).map(|(c, b)| c[t] * b).sum();
            (y[t] - fitted).powi(2)
        })
        .sum();
    let sigma2 = ssr / (n - k) as f64;

    let mut std_errors = Vec::with_capacity(k);
    let mut unit = vec![0.0; k];
    for i in 0..k {
        unit.iter_mut().for_each(|u| *u = 0.0);
        unit[i] = 1.0;
        // Diagonal of (X'X)^-1
        let inv_ii = chol_solve(&chol, &unit)[i];
        std_errors.push((sigma2 * inv_ii).sqrt());
    }

    Ok(OlsFit {
        params,
        std_errors,
        ssr,
        nobs: n,
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= a[i][i].abs() * 1e-12 || sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve `L L' x = b` by forward then backward substitution.
fn chol_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}
