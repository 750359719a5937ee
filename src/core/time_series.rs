//! TimeSeries data structure for representing temporal data.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Utc};

/// A time series with a strictly increasing timestamp index and one or more
/// value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    /// Values stored in column-major format: values[column][observation]
    values: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl TimeSeries {
    /// Create a new TimeSeries from column-major values.
    ///
    /// Fails when the index is not strictly increasing or a column length
    /// differs from the index length.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Vec<f64>>,
        labels: Vec<String>,
    ) -> Result<Self> {
        if let Some(i) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::TimestampError(format!(
                "timestamps must be strictly increasing (position {})",
                i + 1
            )));
        }

        for column in &values {
            if column.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
        }

        if !labels.is_empty() && labels.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: labels.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            labels,
        })
    }

    /// Create a simple univariate time series.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![values], vec![])
    }

    /// Create a univariate series with one observation per day starting at `start`.
    pub fn daily(start: DateTime<Utc>, values: Vec<f64>) -> Result<Self> {
        let timestamps = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self::univariate(timestamps, values)
    }

    /// Attach column labels.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if !labels.is_empty() && labels.len() != self.dimensions() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.dimensions(),
                got: labels.len(),
            });
        }
        self.labels = labels;
        Ok(self)
    }

    /// Build a univariate series sharing this series' index.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        Self::univariate(self.timestamps.clone(), values)
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get the number of value columns (1 for univariate).
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is multivariate.
    pub fn is_multivariate(&self) -> bool {
        self.values.len() > 1
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// First timestamp, if any.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    /// Last timestamp, if any.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Get values for a specific column.
    pub fn values(&self, dimension: usize) -> Result<&[f64]> {
        self.values
            .get(dimension)
            .map(|v| v.as_slice())
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "column {} out of range (series has {})",
                    dimension,
                    self.values.len()
                ))
            })
    }

    /// Get primary (first column) values.
    pub fn primary_values(&self) -> &[f64] {
        self.values.first().map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get column labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label of a column, if labels were set.
    pub fn label(&self, dimension: usize) -> Option<&str> {
        self.labels.get(dimension).map(|s| s.as_str())
    }

    /// Iterate over `(timestamp, primary value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.primary_values().iter().copied())
    }

    /// Get a contiguous slice of observations `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "slice end {} exceeds series length {}",
                end,
                self.len()
            )));
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self
                .values
                .iter()
                .map(|column| column[start..end].to_vec())
                .collect(),
            labels: self.labels.clone(),
        })
    }

    /// Keep only observations for which `keep(index)` holds.
    fn select<F>(&self, keep: F) -> TimeSeries
    where
        F: Fn(usize) -> bool,
    {
        let indices: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        TimeSeries {
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            values: self
                .values
                .iter()
                .map(|column| indices.iter().map(|&i| column[i]).collect())
                .collect(),
            labels: self.labels.clone(),
        }
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values
            .iter()
            .any(|column| column.iter().any(|v| !v.is_finite()))
    }

    /// Return a copy without observations that are missing in any column.
    pub fn drop_missing(&self) -> TimeSeries {
        self.select(|i| self.values.iter().all(|column| column[i].is_finite()))
    }

    /// Return the observations whose calendar year lies in `[first, last]`.
    pub fn between_years(&self, first: i32, last: i32) -> TimeSeries {
        self.select(|i| {
            let year = self.timestamps[i].year();
            year >= first && year <= last
        })
    }
}

/// Input accepted by the splitter and the pipeline.
///
/// A frame may carry several columns; only single-column frames can be
/// analysed.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesInput {
    /// A univariate series.
    Series(TimeSeries),
    /// A column frame that must contain exactly one column.
    Frame(TimeSeries),
}

impl SeriesInput {
    /// Reduce the input to a univariate series.
    pub fn into_univariate(self) -> Result<TimeSeries> {
        match self {
            SeriesInput::Series(series) => {
                if series.dimensions() > 1 {
                    return Err(ForecastError::InvalidParameter(format!(
                        "expected a univariate series, got {} columns",
                        series.dimensions()
                    )));
                }
                Ok(series)
            }
            SeriesInput::Frame(frame) => {
                if frame.dimensions() != 1 {
                    return Err(ForecastError::InvalidParameter(format!(
                        "frame must contain exactly one column, got {}",
                        frame.dimensions()
                    )));
                }
                Ok(frame)
            }
        }
    }
}

impl From<TimeSeries> for SeriesInput {
    fn from(series: TimeSeries) -> Self {
        SeriesInput::Series(series)
    }
}
