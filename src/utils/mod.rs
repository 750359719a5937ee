//! Utility functions shared by models, tests and the pipeline.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod split;
pub mod stats;

pub use metrics::{calculate_metrics, ErrorMetrics};
pub use ols::{ols_fit, OlsFit};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use split::{split_series, SplitConfig, SplitResult};
pub use stats::{chi_squared_sf, quantile_normal};
