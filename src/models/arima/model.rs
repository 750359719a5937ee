//! Seasonal ARIMA model with one-step-ahead forecasting and in-place updates.

use crate::core::{Forecast, StepForecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::config::{ArimaConfig, ArimaOrder, SeasonalOrder, UpdatePolicy};
use crate::models::arima::diff::{difference, differencing_lags, poly_mul, seasonal_difference};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Coefficient bound keeping AR and MA factors away from the unit circle.
const COEF_BOUND: f64 = 0.99;

/// Estimated coefficients in factored form.
#[derive(Debug, Clone, PartialEq)]
struct Coefficients {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Unpack an optimizer vector laid out as `[mu?, ar, ma, sar, sma]`.
    fn from_params(params: &[f64], config: &ArimaConfig) -> Self {
        let (intercept, rest) = if config.with_intercept {
            (params[0], &params[1..])
        } else {
            (0.0, params)
        };
        let (ar, rest) = rest.split_at(config.order.p);
        let (ma, rest) = rest.split_at(config.order.q);
        let (seasonal_ar, seasonal_ma) = rest.split_at(config.seasonal_order.p);
        Self {
            intercept,
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ar: seasonal_ar.to_vec(),
            seasonal_ma: seasonal_ma.to_vec(),
        }
    }

    fn to_params(&self, with_intercept: bool) -> Vec<f64> {
        let mut params = Vec::new();
        if with_intercept {
            params.push(self.intercept);
        }
        params.extend(&self.ar);
        params.extend(&self.ma);
        params.extend(&self.seasonal_ar);
        params.extend(&self.seasonal_ma);
        params
    }

    /// Multiply out the seasonal and non-seasonal factors.
    fn expand(&self, period: usize) -> Lags {
        // AR factors are (1 - sum phi_i B^i); MA factors are (1 + sum theta_i B^i).
        let ar = poly_mul(
            &lag_polynomial(&self.ar, 1, -1.0),
            &lag_polynomial(&self.seasonal_ar, period, -1.0),
        );
        let ma = poly_mul(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, period, 1.0),
        );
        Lags {
            intercept: self.intercept,
            ar: ar.iter().skip(1).map(|c| -c).collect(),
            ma: ma.iter().skip(1).copied().collect(),
        }
    }
}

fn lag_polynomial(coefs: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

/// Expanded lag coefficients of the differenced ARMA recursion.
struct Lags {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl Lags {
    fn start(&self) -> usize {
        self.ar.len().max(self.ma.len())
    }

    /// Prediction of the next differenced value given its past and past innovations.
    fn predict(&self, w: &[f64], e: &[f64]) -> f64 {
        let t = w.len();
        let mut pred = self.intercept;
        for (k, a) in self.ar.iter().enumerate() {
            pred += a * (w[t - 1 - k] - self.intercept);
        }
        for (k, b) in self.ma.iter().enumerate() {
            pred += b * e[t - 1 - k];
        }
        pred
    }

    /// Conditional innovations; zero before the warm-up point.
    fn residuals(&self, w: &[f64]) -> Vec<f64> {
        let start = self.start();
        let mut e = vec![0.0; w.len()];
        for t in start..w.len() {
            e[t] = w[t] - self.predict(&w[..t], &e[..t]);
        }
        e
    }

    fn css(&self, w: &[f64]) -> f64 {
        let start = self.start();
        self.residuals(w)[start.min(w.len())..]
            .iter()
            .map(|r| r * r)
            .sum()
    }
}

/// Seasonal ARIMA model `(p,d,q)(P,D,Q)_m` estimated by conditional sum of squares.
///
/// The model owns the observed history. [`update`](Self::update) appends an
/// observation in place, so a rolling forecast needs exclusive access to the
/// model for its whole run.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use forecast_lab::core::TimeSeries;
/// use forecast_lab::models::arima::ArimaModel;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let values: Vec<f64> = (0..60).map(|i| 10.0 + 0.5 * i as f64 + (i as f64).sin()).collect();
/// let ts = TimeSeries::daily(start, values).unwrap();
///
/// let model = ArimaModel::fit(&ts, (1, 1, 0), (0, 0, 0, 0)).unwrap();
/// let step = model.forecast_next(0.05).unwrap();
/// assert!(step.lower <= step.point && step.point <= step.upper);
/// ```
#[derive(Debug, Clone)]
pub struct ArimaModel {
    config: ArimaConfig,
    coefficients: Coefficients,
    /// Observed values: the training segment followed by every update.
    history: Vec<f64>,
    /// Differenced history `w`.
    differenced: Vec<f64>,
    /// Conditional innovations aligned with `differenced`.
    innovations: Vec<f64>,
    /// Lag coefficients of the differencing operator.
    diff_lags: Vec<f64>,
    train_index: Vec<DateTime<Utc>>,
    sigma2: f64,
    css: f64,
    converged: bool,
}

impl ArimaModel {
    /// Fit a model with the given orders and default settings.
    pub fn fit(
        train: &TimeSeries,
        order: impl Into<ArimaOrder>,
        seasonal_order: impl Into<SeasonalOrder>,
    ) -> Result<Self> {
        Self::fit_with_config(train, &ArimaConfig::new(order, seasonal_order))
    }

    /// Fit a model with explicit settings.
    pub fn fit_with_config(train: &TimeSeries, config: &ArimaConfig) -> Result<Self> {
        config.seasonal_order.validate()?;

        let values = train.primary_values();
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        let start = config.ar_span().max(config.ma_span());
        let needed = config.diff_span() + start + config.num_params() + 1;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let seasonal = config.seasonal_order;
        let period = seasonal.effective_period();
        let differenced = seasonal_difference(&difference(values, config.order.d), seasonal.d, period);
        let diff_lags = differencing_lags(config.order.d, seasonal.d, period);

        let initial = initial_coefficients(&differenced, config);
        let (coefficients, converged) =
            estimate(&differenced, config, &initial, &config.optimizer)?;
        if !converged {
            return Err(ForecastError::EstimationFailed(format!(
                "optimizer did not converge within {} iterations",
                config.optimizer.max_iter
            )));
        }

        let mut model = Self {
            config: config.clone(),
            coefficients,
            history: values.to_vec(),
            differenced,
            innovations: Vec::new(),
            diff_lags,
            train_index: train.timestamps().to_vec(),
            sigma2: f64::NAN,
            css: f64::NAN,
            converged,
        };
        model.refresh_state()?;

        info!(
            order = %config.order,
            seasonal_order = %config.seasonal_order,
            intercept = model.coefficients.intercept,
            ar = ?model.coefficients.ar,
            ma = ?model.coefficients.ma,
            sigma2 = model.sigma2,
            "fitted ARIMA model"
        );

        Ok(model)
    }

    /// Recompute innovations, CSS and innovation variance from the current coefficients.
    fn refresh_state(&mut self) -> Result<()> {
        let lags = self.lags();
        self.innovations = lags.residuals(&self.differenced);

        let start = lags.start();
        let effective = self.differenced.len().saturating_sub(start);
        self.css = self.innovations[start.min(self.innovations.len())..]
            .iter()
            .map(|r| r * r)
            .sum();
        if !self.css.is_finite() {
            return Err(ForecastError::EstimationFailed(
                "conditional sum of squares is not finite".into(),
            ));
        }
        self.sigma2 = self.css / effective.max(1) as f64;
        Ok(())
    }

    fn lags(&self) -> Lags {
        self.coefficients
            .expand(self.config.seasonal_order.effective_period())
    }

    /// Value of the differencing recursion `sum_k c_k y_{T-k}` for the next index.
    fn integration_term(&self, upto: usize) -> f64 {
        self.diff_lags
            .iter()
            .enumerate()
            .map(|(k, c)| c * self.history[upto - 1 - k])
            .sum()
    }

    /// Number of leading training observations without a fitted value.
    ///
    /// `max(p + P*m, q + Q*m) + d + D*m`, which reduces to `max(p, q) + d`
    /// without a seasonal component.
    pub fn warmup_offset(&self) -> usize {
        self.config.ar_span().max(self.config.ma_span()) + self.config.diff_span()
    }

    /// Fitted values on the original scale over the training segment.
    ///
    /// The result has one entry per training observation; the first
    /// [`warmup_offset`](Self::warmup_offset) entries are NaN.
    pub fn predict_in_sample(&self) -> Vec<f64> {
        let offset = self.warmup_offset();
        let span = self.diff_lags.len();
        let n_train = self.n_train();

        (0..n_train)
            .map(|t| {
                if t < offset {
                    return f64::NAN;
                }
                let j = t - span;
                let fitted_w = self.differenced[j] - self.innovations[j];
                fitted_w + self.integration_term(t)
            })
            .collect()
    }

    /// Observed minus fitted values on the training segment beyond the warm-up offset.
    pub fn residuals_in_sample(&self) -> Vec<f64> {
        let start = self.config.ar_span().max(self.config.ma_span());
        let end = self.n_train() - self.diff_lags.len();
        self.innovations[start.min(end)..end].to_vec()
    }

    /// In-sample residuals indexed by their training timestamps.
    pub fn residuals_in_sample_series(&self) -> Result<TimeSeries> {
        let offset = self.warmup_offset().min(self.train_index.len());
        TimeSeries::univariate(
            self.train_index[offset..].to_vec(),
            self.residuals_in_sample(),
        )
    }

    /// One-step-ahead forecast with a two-sided `1 - alpha` normal interval.
    pub fn forecast_next(&self, alpha: f64) -> Result<StepForecast> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                alpha
            )));
        }

        let w_hat = self.lags().predict(&self.differenced, &self.innovations);
        let point = w_hat + self.integration_term(self.history.len());
        let half_width = quantile_normal(1.0 - alpha / 2.0) * self.sigma2.sqrt();

        Ok(StepForecast {
            point,
            lower: point - half_width,
            upper: point + half_width,
        })
    }

    /// Append an observed value and advance the model state.
    ///
    /// With [`UpdatePolicy::Refit`] the coefficients are re-estimated for a
    /// few iterations starting from their current values.
    pub fn update(&mut self, observation: f64) -> Result<()> {
        if !observation.is_finite() {
            return Err(ForecastError::MissingValues);
        }

        let lags = self.lags();
        let w_new = observation - self.integration_term(self.history.len());
        let innovation = w_new - lags.predict(&self.differenced, &self.innovations);

        self.history.push(observation);
        self.differenced.push(w_new);
        self.innovations.push(innovation);

        if let UpdatePolicy::Refit { max_iter } = self.config.update_policy {
            self.refit(max_iter)?;
        }
        Ok(())
    }

    fn refit(&mut self, max_iter: usize) -> Result<()> {
        let optimizer = NelderMeadConfig {
            max_iter,
            ..self.config.optimizer.clone()
        };
        let (candidate, converged) =
            estimate(&self.differenced, &self.config, &self.coefficients, &optimizer)?;

        let period = self.config.seasonal_order.effective_period();
        let previous_css = self.coefficients.expand(period).css(&self.differenced);
        let candidate_css = candidate.expand(period).css(&self.differenced);
        if candidate_css <= previous_css {
            self.coefficients = candidate;
        }
        if !converged {
            debug!(max_iter, "refit stopped before convergence");
        }
        self.refresh_state()
    }

    /// Forecast each test observation one step ahead, then absorb it.
    ///
    /// Steps run strictly in index order: forecast, record, update with the
    /// observed value. The returned forecast has one entry per test
    /// observation.
    pub fn rolling_forecast(&mut self, test: &TimeSeries, alpha: f64) -> Result<Forecast> {
        if let (Some(first), Some(last_train)) = (test.start(), self.train_index.last()) {
            if first <= *last_train {
                return Err(ForecastError::TimestampError(
                    "test segment must start after the training segment".into(),
                ));
            }
        }

        let mut forecast = Forecast::with_capacity(test.len());
        for (timestamp, observed) in test.iter() {
            let step = self.forecast_next(alpha)?;
            debug!(
                %timestamp,
                point = step.point,
                lower = step.lower,
                upper = step.upper,
                observed,
                "one-step forecast"
            );
            forecast.push(timestamp, step);
            self.update(observed)?;
        }
        Ok(forecast)
    }

    /// Observed minus forecast values, aligned to the test index.
    pub fn residuals_out_of_sample(test: &TimeSeries, forecast: &Forecast) -> Result<TimeSeries> {
        if test.len() != forecast.horizon() {
            return Err(ForecastError::DimensionMismatch {
                expected: test.len(),
                got: forecast.horizon(),
            });
        }
        if test.timestamps() != forecast.timestamps() {
            return Err(ForecastError::TimestampError(
                "forecast is not aligned with the test index".into(),
            ));
        }

        let residuals = test
            .primary_values()
            .iter()
            .zip(forecast.point())
            .map(|(y, f)| y - f)
            .collect();
        test.with_values(residuals)
    }

    /// Estimation settings.
    pub fn config(&self) -> &ArimaConfig {
        &self.config
    }

    /// Non-seasonal order.
    pub fn order(&self) -> ArimaOrder {
        self.config.order
    }

    /// Seasonal order.
    pub fn seasonal_order(&self) -> SeasonalOrder {
        self.config.seasonal_order
    }

    /// Non-seasonal AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    /// Non-seasonal MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    /// Seasonal AR coefficients.
    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ar
    }

    /// Seasonal MA coefficients.
    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.seasonal_ma
    }

    /// Mean of the differenced series (zero without intercept).
    pub fn intercept(&self) -> f64 {
        self.coefficients.intercept
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Conditional sum of squared innovations.
    pub fn css(&self) -> f64 {
        self.css
    }

    /// Number of innovations entering the conditional likelihood.
    pub fn nobs(&self) -> usize {
        self.differenced
            .len()
            .saturating_sub(self.config.ar_span().max(self.config.ma_span()))
    }

    /// Number of training observations.
    pub fn n_train(&self) -> usize {
        self.train_index.len()
    }

    /// Whether the most recent estimation met its tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    fn log_likelihood(&self) -> f64 {
        let n = self.nobs() as f64;
        -0.5 * n * (1.0 + self.sigma2.ln() + (2.0 * std::f64::consts::PI).ln())
    }

    /// Akaike information criterion; the innovation variance counts as a parameter.
    pub fn aic(&self) -> f64 {
        let k = (self.config.num_params() + 1) as f64;
        -2.0 * self.log_likelihood() + 2.0 * k
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> f64 {
        let k = (self.config.num_params() + 1) as f64;
        -2.0 * self.log_likelihood() + k * (self.nobs() as f64).ln()
    }
}

fn initial_coefficients(differenced: &[f64], config: &ArimaConfig) -> Coefficients {
    let starting = |n: usize| (0..n).map(|i| 0.1 / (i + 1) as f64).collect::<Vec<_>>();
    Coefficients {
        intercept: if config.with_intercept {
            mean(differenced)
        } else {
            0.0
        },
        ar: starting(config.order.p),
        ma: starting(config.order.q),
        seasonal_ar: starting(config.seasonal_order.p),
        seasonal_ma: starting(config.seasonal_order.q),
    }
}

/// Minimise the conditional sum of squares starting from `initial`.
///
/// Returns the coefficients and whether the optimizer converged.
fn estimate(
    differenced: &[f64],
    config: &ArimaConfig,
    initial: &Coefficients,
    optimizer: &NelderMeadConfig,
) -> Result<(Coefficients, bool)> {
    let num_params = config.num_params();
    let has_arma = num_params > usize::from(config.with_intercept);

    if !has_arma {
        // The CSS minimiser of a pure mean model is the sample mean.
        let intercept = if config.with_intercept {
            mean(differenced)
        } else {
            0.0
        };
        return Ok((
            Coefficients {
                intercept,
                ..initial.clone()
            },
            true,
        ));
    }

    let period = config.seasonal_order.effective_period();
    let mut bounds = Vec::with_capacity(num_params);
    if config.with_intercept {
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
    }
    bounds.resize(num_params, (-COEF_BOUND, COEF_BOUND));

    let result = nelder_mead(
        |params| Coefficients::from_params(params, config).expand(period).css(differenced),
        &initial.to_params(config.with_intercept),
        Some(&bounds),
        optimizer,
    );

    if !result.optimal_value.is_finite() {
        warn!("conditional sum of squares diverged for every candidate");
        return Err(ForecastError::EstimationFailed(
            "conditional sum of squares is not finite".into(),
        ));
    }

    Ok((
        Coefficients::from_params(&result.optimal_point, config),
        result.converged,
    ))
}
