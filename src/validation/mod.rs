//! Statistical validation tests for time series models.
//!
//! Provides diagnostic tests for model residuals and a unit-root test.
//!
//! # Example
//!
//! ```
//! use forecast_lab::validation::{adf_test, diagnose_residuals, ljung_box, AdfConfig};
//!
//! // Check if residuals are white noise
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, 5);
//! if lb.is_white_noise(0.05) {
//!     println!("Residuals pass Ljung-Box test");
//! }
//! println!("{}", diagnose_residuals(&residuals));
//!
//! // Test stationarity
//! let series: Vec<f64> = (0..60).map(|i| ((i * 17 + 13) % 23) as f64).collect();
//! let outcome = adf_test(&series, &AdfConfig::default()).unwrap();
//! println!("{}", outcome);
//! ```

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{
    diagnose_residuals, diagnostic_lags, ljung_box, AutocorrelationVerdict, LjungBoxLag,
    LjungBoxResult, ResidualDiagnostics,
};
pub use stationarity::{
    adf_test, mackinnon_critical_values, mackinnon_p_value, AdfConfig, AdfOutcome, AdfResult,
    Autolag, CriticalValues, Regression,
};
