//! Data transformations for time series.
//!
//! Provides moving-window smoothers and the residual series left after
//! removing them.
//!
//! # Example
//!
//! ```
//! use forecast_lab::transform::{ewm_mean, rolling_mean};
//!
//! let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//!
//! // Rolling mean with window 3
//! let rm = rolling_mean(&series, 3, false);
//! assert!(rm[1].is_nan());
//! assert_eq!(rm[4], 4.0);
//!
//! // Exponentially weighted mean
//! let ewm = ewm_mean(&series, 0.5);
//! assert_eq!(ewm.len(), 5);
//! ```

pub mod window;

pub use window::{
    ewm_mean, ewm_residual, moving_average_residual, rolling_mean, SmoothingResidual,
};
