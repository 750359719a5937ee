//! Series features used for model identification.
//!
//! # Example
//!
//! ```
//! use forecast_lab::features::{acf_with_confint, pacf};
//!
//! let series: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin()).collect();
//!
//! let correlogram = acf_with_confint(&series, 10, 0.05);
//! assert_eq!(correlogram.values.len(), 11);
//!
//! let partial = pacf(&series, 5);
//! assert_eq!(partial.len(), 6);
//! ```

pub mod autocorrelation;

pub use autocorrelation::{
    acf, acf_with_confint, default_lags, pacf, pacf_with_confint, Correlogram,
};
