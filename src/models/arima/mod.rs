//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with (p, d, q) and seasonal (P, D, Q)\[m\] orders
//! - One-step-ahead forecasts with normal intervals
//! - In-place updates for rolling evaluation

mod config;
mod diff;
mod model;

pub use config::{ArimaConfig, ArimaOrder, SeasonalOrder, UpdatePolicy};
pub use diff::{difference, differencing_lags, seasonal_difference};
pub use model::ArimaModel;
