//! Forecasting models.

pub mod arima;

pub use arima::{ArimaConfig, ArimaModel, ArimaOrder, SeasonalOrder, UpdatePolicy};
