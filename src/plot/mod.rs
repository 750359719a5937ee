//! SVG rendering of series, forecasts and diagnostics.
//!
//! Every function takes finished data and an output path; nothing here
//! computes model results. Rendering failures surface as
//! [`ForecastError::Render`](crate::error::ForecastError::Render).
//!
//! The [`PlotSink`] trait connects this layer to the
//! [`Pipeline`](crate::pipeline::Pipeline): a pipeline without a sink runs
//! headless.

mod charts;

pub use charts::{
    plot_acf_pacf, plot_annual_trend, plot_correlogram, plot_forecast_with_interval,
    plot_in_sample, plot_residuals, plot_series, plot_smoothing_residual, plot_train_test_split,
    YearSpan,
};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::features::autocorrelation::{acf_with_confint, default_lags};
use crate::models::ArimaOrder;
use plotters::style::RGBColor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size, labels and colours shared by all charts.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Caption font size
    pub title_font_size: u32,
    /// X axis description
    pub x_label: String,
    /// Y axis description
    pub y_label: String,
    /// Colour of observed values
    pub primary: RGBColor,
    /// Colour of fitted, forecast or smoothed values
    pub secondary: RGBColor,
    /// Colour of residuals and test segments
    pub accent: RGBColor,
    /// Opacity of shaded intervals
    pub band_opacity: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 500,
            title_font_size: 24,
            x_label: "Date".to_string(),
            y_label: "Value".to_string(),
            primary: RGBColor(31, 119, 180),
            secondary: RGBColor(255, 127, 14),
            accent: RGBColor(214, 39, 40),
            band_opacity: 0.2,
        }
    }
}

impl PlotStyle {
    /// Set the image size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the axis descriptions.
    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    /// Set the series colours.
    pub fn with_colors(mut self, primary: RGBColor, secondary: RGBColor, accent: RGBColor) -> Self {
        self.primary = primary;
        self.secondary = secondary;
        self.accent = accent;
        self
    }
}

/// Stage output handed to a [`PlotSink`].
#[derive(Debug, Clone, Copy)]
pub enum PlotRequest<'a> {
    /// Training series with in-sample one-step predictions.
    InSample {
        train: &'a TimeSeries,
        fitted: &'a [f64],
        offset: usize,
        order: ArimaOrder,
    },
    /// A residual series; `stage` names where it came from.
    Residuals {
        stage: &'a str,
        residuals: &'a TimeSeries,
    },
    /// Test segment with its rolling forecast.
    Forecast {
        test: &'a TimeSeries,
        forecast: &'a Forecast,
    },
}

/// Receiver of pipeline stage outputs.
pub trait PlotSink {
    /// Render one stage output.
    fn render(&mut self, request: PlotRequest<'_>) -> Result<()>;
}

/// Writes one SVG file per request into a directory.
///
/// Residual requests produce two files: the residual series and its ACF.
#[derive(Debug, Clone)]
pub struct SvgPlotSink {
    dir: PathBuf,
    prefix: String,
    style: PlotStyle,
    written: Vec<PathBuf>,
}

impl SvgPlotSink {
    /// Sink writing into `dir`, which must exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "arima".to_string(),
            style: PlotStyle::default(),
            written: Vec::new(),
        }
    }

    /// Prefix for file names.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Chart style.
    pub fn with_style(mut self, style: PlotStyle) -> Self {
        self.style = style;
        self
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.svg", slug(&self.prefix), slug(name)))
    }

    fn record(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "wrote plot");
        self.written.push(path);
    }
}

impl PlotSink for SvgPlotSink {
    fn render(&mut self, request: PlotRequest<'_>) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(ForecastError::Render(format!(
                "output directory {} does not exist",
                self.dir.display()
            )));
        }

        match request {
            PlotRequest::InSample {
                train,
                fitted,
                offset,
                order,
            } => {
                let path = self.file("in_sample");
                let title = format!("In-sample forecast {}", order);
                plot_in_sample(&path, train, fitted, offset, &title, &self.style)?;
                self.record(path);
            }
            PlotRequest::Residuals { stage, residuals } => {
                let path = self.file(&format!("residuals_{}", stage));
                plot_residuals(&path, residuals, &format!("Residuals {}", stage), &self.style)?;
                self.record(path);

                let values = residuals.primary_values();
                let correlogram = acf_with_confint(values, default_lags(values.len()), 0.05);
                let path = self.file(&format!("acf_{}", stage));
                plot_correlogram(&path, &correlogram, &format!("ACF - Residuals {}", stage), &self.style)?;
                self.record(path);
            }
            PlotRequest::Forecast { test, forecast } => {
                let path = self.file("forecast");
                plot_forecast_with_interval(&path, test, forecast, "Out-of-sample forecast", &self.style)?;
                self.record(path);
            }
        }
        Ok(())
    }
}

/// Lowercase file-name fragment with runs of other characters collapsed to `_`.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Ensure the parent directory of `path` exists before rendering.
pub(crate) fn check_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ForecastError::Render(format!(
                "directory {} does not exist",
                parent.display()
            )))
        }
        _ => Ok(()),
    }
}
