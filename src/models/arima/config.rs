//! Orders and estimation settings for ARIMA models.

use crate::error::{ForecastError, Result};
use crate::utils::optimization::NelderMeadConfig;
use std::fmt;

/// Non-seasonal ARIMA order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl From<(usize, usize, usize)> for ArimaOrder {
    fn from((p, d, q): (usize, usize, usize)) -> Self {
        Self::new(p, d, q)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q, m)`.
///
/// The default `(0,0,0,0)` means no seasonal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Season length (m)
    pub period: usize,
}

impl SeasonalOrder {
    /// Create a new seasonal order.
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// No seasonal component.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any seasonal term is requested.
    pub fn is_active(&self) -> bool {
        self.p + self.d + self.q > 0
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_active() && self.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal order {} requires a season length of at least 2",
                self
            )));
        }
        Ok(())
    }

    /// Period used in lag arithmetic; zero when inactive.
    pub(crate) fn effective_period(&self) -> usize {
        if self.is_active() {
            self.period
        } else {
            0
        }
    }
}

impl From<(usize, usize, usize, usize)> for SeasonalOrder {
    fn from((p, d, q, period): (usize, usize, usize, usize)) -> Self {
        Self::new(p, d, q, period)
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.p, self.d, self.q, self.period)
    }
}

/// How [`ArimaModel::update`](super::ArimaModel::update) treats parameters
/// after appending an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Keep the fitted parameters and only extend the state.
    Filter,
    /// Warm-start a short re-estimation from the current parameters.
    /// Non-convergence within `max_iter` iterations is tolerated.
    Refit { max_iter: usize },
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        UpdatePolicy::Refit { max_iter: 5 }
    }
}

/// Estimation settings for [`ArimaModel`](super::ArimaModel).
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaConfig {
    /// Non-seasonal order.
    pub order: ArimaOrder,
    /// Seasonal order.
    pub seasonal_order: SeasonalOrder,
    /// Estimate a mean for the differenced series.
    pub with_intercept: bool,
    /// Optimizer settings for the initial fit.
    pub optimizer: NelderMeadConfig,
    /// Behaviour of `update`.
    pub update_policy: UpdatePolicy,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            seasonal_order: SeasonalOrder::none(),
            with_intercept: true,
            optimizer: NelderMeadConfig::default().with_max_iter(5000),
            update_policy: UpdatePolicy::default(),
        }
    }
}

impl ArimaConfig {
    /// Configuration for the given orders with default settings.
    pub fn new(order: impl Into<ArimaOrder>, seasonal_order: impl Into<SeasonalOrder>) -> Self {
        Self {
            order: order.into(),
            seasonal_order: seasonal_order.into(),
            ..Default::default()
        }
    }

    /// Set the non-seasonal order.
    pub fn with_order(mut self, order: impl Into<ArimaOrder>) -> Self {
        self.order = order.into();
        self
    }

    /// Set the seasonal order.
    pub fn with_seasonal_order(mut self, seasonal_order: impl Into<SeasonalOrder>) -> Self {
        self.seasonal_order = seasonal_order.into();
        self
    }

    /// Enable or disable the intercept.
    pub fn with_intercept(mut self, with_intercept: bool) -> Self {
        self.with_intercept = with_intercept;
        self
    }

    /// Set the optimizer configuration.
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Set the update policy.
    pub fn with_update_policy(mut self, update_policy: UpdatePolicy) -> Self {
        self.update_policy = update_policy;
        self
    }

    /// Highest AR lag of the expanded multiplicative polynomial.
    pub(crate) fn ar_span(&self) -> usize {
        self.order.p + self.seasonal_order.p * self.seasonal_order.effective_period()
    }

    /// Highest MA lag of the expanded multiplicative polynomial.
    pub(crate) fn ma_span(&self) -> usize {
        self.order.q + self.seasonal_order.q * self.seasonal_order.effective_period()
    }

    /// Observations consumed by differencing.
    pub(crate) fn diff_span(&self) -> usize {
        self.order.d + self.seasonal_order.d * self.seasonal_order.effective_period()
    }

    /// Number of estimated coefficients, intercept included.
    pub(crate) fn num_params(&self) -> usize {
        self.order.p
            + self.order.q
            + self.seasonal_order.p
            + self.seasonal_order.q
            + usize::from(self.with_intercept)
    }
}
