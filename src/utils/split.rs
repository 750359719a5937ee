//! Chronological train/validation/test splitting.

use crate::core::{SeriesInput, TimeSeries};
use crate::error::{ForecastError, Result};
use std::fmt;
use tracing::{debug, info};

/// Tolerance absorbing representation error before flooring segment sizes.
const SIZE_TOLERANCE: f64 = 1e-9;

/// Configuration for splitting a series.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    /// Fraction of observations assigned to the training segment.
    pub train_fraction: f64,
    /// Fraction assigned to the validation segment; `None` skips validation.
    pub validation_fraction: Option<f64>,
    /// Log a summary of segment sizes.
    pub verbose: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            validation_fraction: None,
            verbose: true,
        }
    }
}

impl SplitConfig {
    /// Train/test split with the given training fraction.
    pub fn train_test(train_fraction: f64) -> Self {
        Self {
            train_fraction,
            ..Default::default()
        }
    }

    /// Train/validation/test split.
    pub fn train_validation_test(train_fraction: f64, validation_fraction: f64) -> Self {
        Self {
            train_fraction,
            validation_fraction: Some(validation_fraction),
            ..Default::default()
        }
    }

    /// Enable or disable the size summary.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if let Some(validation) = self.validation_fraction {
            if !(validation > 0.0 && validation < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "validation_fraction must be in (0, 1), got {}",
                    validation
                )));
            }
            if self.train_fraction + validation >= 1.0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "train_fraction + validation_fraction must be < 1, got {}",
                    self.train_fraction + validation
                )));
            }
        }
        Ok(())
    }
}

/// Contiguous segments produced by [`split_series`].
#[derive(Debug, Clone, PartialEq)]
pub enum SplitResult {
    /// Training and test segments.
    TrainTest { train: TimeSeries, test: TimeSeries },
    /// Training, validation and test segments.
    TrainValidationTest {
        train: TimeSeries,
        validation: TimeSeries,
        test: TimeSeries,
    },
}

impl SplitResult {
    /// Training segment.
    pub fn train(&self) -> &TimeSeries {
        match self {
            SplitResult::TrainTest { train, .. } => train,
            SplitResult::TrainValidationTest { train, .. } => train,
        }
    }

    /// Validation segment, when one was requested.
    pub fn validation(&self) -> Option<&TimeSeries> {
        match self {
            SplitResult::TrainTest { .. } => None,
            SplitResult::TrainValidationTest { validation, .. } => Some(validation),
        }
    }

    /// Test segment.
    pub fn test(&self) -> &TimeSeries {
        match self {
            SplitResult::TrainTest { test, .. } => test,
            SplitResult::TrainValidationTest { test, .. } => test,
        }
    }

    /// Total number of observations across all segments.
    pub fn total_len(&self) -> usize {
        self.train().len() + self.validation().map_or(0, |v| v.len()) + self.test().len()
    }

    /// Consume into `(train, test)`, discarding any validation segment.
    pub fn into_train_test(self) -> (TimeSeries, TimeSeries) {
        match self {
            SplitResult::TrainTest { train, test } => (train, test),
            SplitResult::TrainValidationTest { train, test, .. } => (train, test),
        }
    }
}

impl fmt::Display for SplitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_len();
        let pct = |len: usize| 100.0 * len as f64 / total.max(1) as f64;

        writeln!(f, "Series with {} records split into:", total)?;
        writeln!(f, "Train ({:.0}%): {}", pct(self.train().len()), self.train().len())?;
        if let Some(validation) = self.validation() {
            writeln!(
                f,
                "Validation ({:.0}%): {}",
                pct(validation.len()),
                validation.len()
            )?;
        }
        write!(f, "Test ({:.0}%): {}", pct(self.test().len()), self.test().len())
    }
}

fn floor_size(fraction: f64, n: usize) -> usize {
    (fraction * n as f64 + SIZE_TOLERANCE).floor() as usize
}

/// Split a series into contiguous, order-preserving segments.
///
/// The earliest `floor(train_fraction * n)` observations form the training
/// segment. With validation, the remainder is divided so that validation
/// receives `floor(validation_fraction / (1 - train_fraction) * rest)`
/// observations and the test segment the rest.
///
/// # Example
/// ```
/// use forecast_lab::core::{SeriesInput, TimeSeries};
/// use forecast_lab::utils::{split_series, SplitConfig};
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let ts = TimeSeries::daily(start, (0..10).map(|i| i as f64).collect()).unwrap();
///
/// let split = split_series(SeriesInput::Series(ts), &SplitConfig::train_test(0.8)).unwrap();
/// assert_eq!(split.train().len(), 8);
/// assert_eq!(split.test().len(), 2);
/// ```
pub fn split_series(input: SeriesInput, config: &SplitConfig) -> Result<SplitResult> {
    config.validate()?;
    let series = input.into_univariate()?;
    let n = series.len();

    let n_train = floor_size(config.train_fraction, n);
    let rest = n - n_train.min(n);

    let result = match config.validation_fraction {
        None => {
            check_segment("train", n_train)?;
            check_segment("test", rest)?;
            SplitResult::TrainTest {
                train: series.slice(0, n_train)?,
                test: series.slice(n_train, n)?,
            }
        }
        Some(validation_fraction) => {
            let share = validation_fraction / (1.0 - config.train_fraction);
            let n_validation = floor_size(share, rest);
            let n_test = rest - n_validation;
            check_segment("train", n_train)?;
            check_segment("validation", n_validation)?;
            check_segment("test", n_test)?;
            SplitResult::TrainValidationTest {
                train: series.slice(0, n_train)?,
                validation: series.slice(n_train, n_train + n_validation)?,
                test: series.slice(n_train + n_validation, n)?,
            }
        }
    };

    if config.verbose {
        for line in result.to_string().lines() {
            info!("{}", line);
        }
    }

    Ok(result)
}

fn check_segment(name: &str, len: usize) -> Result<()> {
    if len == 0 {
        debug!(segment = name, "split produced an empty segment");
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(())
}
