//! Chart functions rendering to SVG files.

use super::{check_parent, PlotStyle};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::features::autocorrelation::{acf_with_confint, pacf_with_confint, Correlogram};
use crate::transform::SmoothingResidual;
use crate::utils::SplitResult;
use chrono::{DateTime, Duration, Utc};
use plotters::coord::types::{RangedCoordf64, RangedDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt;
use std::ops::Range;
use std::path::Path;

type TimeCoord = Cartesian2d<RangedDateTime<DateTime<Utc>>, RangedCoordf64>;
type LagCoord = Cartesian2d<RangedCoordf64, RangedCoordf64>;
type Panel<'a> = DrawingArea<SVGBackend<'a>, Shift>;

fn render_err<E: fmt::Display>(e: E) -> ForecastError {
    ForecastError::Render(e.to_string())
}

/// Calendar years selected by [`plot_annual_trend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSpan {
    /// A single year; points are labelled with their values.
    Single(i32),
    /// An inclusive range of years.
    Range(i32, i32),
}

impl YearSpan {
    fn bounds(&self) -> (i32, i32) {
        match *self {
            YearSpan::Single(year) => (year, year),
            YearSpan::Range(first, last) => (first, last),
        }
    }
}

impl From<i32> for YearSpan {
    fn from(year: i32) -> Self {
        YearSpan::Single(year)
    }
}

impl From<(i32, i32)> for YearSpan {
    fn from((first, last): (i32, i32)) -> Self {
        YearSpan::Range(first, last)
    }
}

impl fmt::Display for YearSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSpan::Single(year) => write!(f, "{}", year),
            YearSpan::Range(first, last) => write!(f, "{}-{}", first, last),
        }
    }
}

fn time_range(timestamps: &[DateTime<Utc>]) -> Result<Range<DateTime<Utc>>> {
    match (timestamps.first(), timestamps.last()) {
        (Some(&first), Some(&last)) if first < last => Ok(first..last),
        (Some(&first), Some(_)) => Ok(first - Duration::days(1)..first + Duration::days(1)),
        _ => Err(ForecastError::EmptyData),
    }
}

/// Finite extent of `values`, padded by 5% of the span.
fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return -1.0..1.0;
    }
    let pad = if hi > lo { 0.05 * (hi - lo) } else { 1.0 };
    (lo - pad)..(hi + pad)
}

fn points<'a>(
    timestamps: &'a [DateTime<Utc>],
    values: &'a [f64],
) -> impl Iterator<Item = (DateTime<Utc>, f64)> + 'a {
    timestamps
        .iter()
        .copied()
        .zip(values.iter().copied())
        .filter(|(_, v)| v.is_finite())
}

fn time_chart<'a, 'b>(
    area: &'a Panel<'b>,
    title: &str,
    x: Range<DateTime<Utc>>,
    y: Range<f64>,
    style: &PlotStyle,
) -> Result<ChartContext<'a, SVGBackend<'b>, TimeCoord>> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", style.title_font_size))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x, y)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(style.x_label.as_str())
        .y_desc(style.y_label.as_str())
        .x_labels(8)
        .x_label_formatter(&|t: &DateTime<Utc>| t.format("%Y-%m-%d").to_string())
        .draw()
        .map_err(render_err)?;

    Ok(chart)
}

fn draw_line(
    chart: &mut ChartContext<'_, SVGBackend<'_>, TimeCoord>,
    data: impl Iterator<Item = (DateTime<Utc>, f64)>,
    color: RGBColor,
    label: &str,
) -> Result<()> {
    chart
        .draw_series(LineSeries::new(data, color.stroke_width(2)))
        .map_err(render_err)?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    Ok(())
}

fn draw_vertical(
    chart: &mut ChartContext<'_, SVGBackend<'_>, TimeCoord>,
    at: DateTime<Utc>,
    y: &Range<f64>,
    label: &str,
) -> Result<()> {
    chart
        .draw_series(LineSeries::new(
            vec![(at, y.start), (at, y.end)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?
        .label(label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(1)));
    Ok(())
}

fn draw_legend<'a, 'b: 'a>(chart: &mut ChartContext<'a, SVGBackend<'b>, TimeCoord>) -> Result<()> {
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)
}

fn open<'a>(path: &'a Path, style: &PlotStyle) -> Result<Panel<'a>> {
    check_parent(path)?;
    let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    Ok(root)
}

fn series_panel(area: &Panel<'_>, series: &TimeSeries, title: &str, style: &PlotStyle) -> Result<()> {
    let x = time_range(series.timestamps())?;
    let y = value_range(series.primary_values());
    let mut chart = time_chart(area, title, x, y, style)?;
    let label = series.label(0).unwrap_or("Series");
    draw_line(
        &mut chart,
        points(series.timestamps(), series.primary_values()),
        style.primary,
        label,
    )?;
    draw_legend(&mut chart)
}

/// Plot the full series over time.
pub fn plot_series(
    path: impl AsRef<Path>,
    series: &TimeSeries,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    let root = open(path.as_ref(), style)?;
    series_panel(&root, series, title, style)?;
    root.present().map_err(render_err)
}

/// Plot the observations falling in a year or inclusive range of years.
///
/// A single year marks every point and labels it with its value. An empty
/// selection or a reversed range fails with `InvalidParameter`.
pub fn plot_annual_trend(
    path: impl AsRef<Path>,
    series: &TimeSeries,
    years: impl Into<YearSpan>,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    let years = years.into();
    let (first, last) = years.bounds();
    if first > last {
        return Err(ForecastError::InvalidParameter(format!(
            "year range {} is reversed",
            years
        )));
    }

    let selected = series.between_years(first, last);
    if selected.is_empty() {
        return Err(ForecastError::InvalidParameter(format!(
            "no observations in {}",
            years
        )));
    }

    let root = open(path.as_ref(), style)?;
    let values = selected.primary_values();
    let x = time_range(selected.timestamps())?;
    let y = value_range(values);
    let span = y.end - y.start;
    let mut chart = time_chart(&root, &format!("{} - {}", title, years), x, y, style)?;

    let color = style.primary;
    draw_line(
        &mut chart,
        points(selected.timestamps(), values),
        color,
        selected.label(0).unwrap_or("Series"),
    )?;

    if let YearSpan::Single(_) = years {
        chart
            .draw_series(points(selected.timestamps(), values).map(|p| Circle::new(p, 4, color.filled())))
            .map_err(render_err)?;
        chart
            .draw_series(points(selected.timestamps(), values).map(|(t, v)| {
                Text::new(format!("{:.1}", v), (t, v + 0.02 * span), ("sans-serif", 12))
            }))
            .map_err(render_err)?;
    }

    draw_legend(&mut chart)?;
    root.present().map_err(render_err)
}

/// Plot training observations against in-sample predictions beyond `offset`.
///
/// `fitted` must be parallel to `train`; the first `offset` points are the
/// warm-up where no prediction exists.
pub fn plot_in_sample(
    path: impl AsRef<Path>,
    train: &TimeSeries,
    fitted: &[f64],
    offset: usize,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    if fitted.len() != train.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: train.len(),
            got: fitted.len(),
        });
    }
    if offset >= train.len() {
        return Err(ForecastError::InsufficientData {
            needed: offset + 1,
            got: train.len(),
        });
    }

    let timestamps = &train.timestamps()[offset..];
    let observed = &train.primary_values()[offset..];
    let fitted = &fitted[offset..];

    let root = open(path.as_ref(), style)?;
    let x = time_range(timestamps)?;
    let y = value_range(observed.iter().chain(fitted));
    let mut chart = time_chart(&root, title, x, y, style)?;

    draw_line(&mut chart, points(timestamps, fitted), style.secondary, "Predicted")?;
    draw_line(&mut chart, points(timestamps, observed), style.primary, "Observed")?;
    draw_legend(&mut chart)?;
    root.present().map_err(render_err)
}

/// Plot the test segment, the one-step forecasts and a shaded interval.
pub fn plot_forecast_with_interval(
    path: impl AsRef<Path>,
    test: &TimeSeries,
    forecast: &Forecast,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    if forecast.horizon() != test.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: test.len(),
            got: forecast.horizon(),
        });
    }

    let root = open(path.as_ref(), style)?;
    let timestamps = forecast.timestamps();
    let x = time_range(timestamps)?;
    let y = value_range(
        test.primary_values()
            .iter()
            .chain(forecast.lower())
            .chain(forecast.upper()),
    );
    let mut chart = time_chart(&root, title, x, y, style)?;

    let band: Vec<(DateTime<Utc>, f64)> = points(timestamps, forecast.upper())
        .chain(
            points(timestamps, forecast.lower())
                .collect::<Vec<_>>()
                .into_iter()
                .rev(),
        )
        .collect();
    let fill = style.secondary.mix(style.band_opacity);
    chart
        .draw_series(std::iter::once(Polygon::new(band, fill.filled())))
        .map_err(render_err)?
        .label("Interval")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], fill.filled()));

    draw_line(&mut chart, points(timestamps, test.primary_values()), style.primary, "Observed")?;
    draw_line(&mut chart, points(timestamps, forecast.point()), style.secondary, "1-step forecast")?;
    draw_legend(&mut chart)?;
    root.present().map_err(render_err)
}

/// Plot a residual series with a zero reference line.
pub fn plot_residuals(
    path: impl AsRef<Path>,
    residuals: &TimeSeries,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    let root = open(path.as_ref(), style)?;
    let x = time_range(residuals.timestamps())?;
    let y = value_range(residuals.primary_values().iter().chain(&[0.0]));
    let mut chart = time_chart(&root, title, x.clone(), y, style)?;

    draw_line(
        &mut chart,
        points(residuals.timestamps(), residuals.primary_values()),
        style.accent,
        "Residual",
    )?;
    chart
        .draw_series(LineSeries::new(
            vec![(x.start, 0.0), (x.end, 0.0)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;
    draw_legend(&mut chart)?;
    root.present().map_err(render_err)
}

fn correlogram_panel(
    area: &Panel<'_>,
    correlogram: &Correlogram,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    let max_lag = correlogram.lags.last().copied().unwrap_or(0) as f64;
    let y = value_range(correlogram.values.iter().chain(&[-1.0, 1.0]));

    let mut chart: ChartContext<'_, SVGBackend<'_>, LagCoord> = ChartBuilder::on(area)
        .caption(title, ("sans-serif", style.title_font_size))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5..max_lag + 0.5, y)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("Lag")
        .y_desc("Correlation")
        .draw()
        .map_err(render_err)?;

    // Band around zero from lag 1 onward.
    if correlogram.lags.len() > 1 {
        let band: Vec<(f64, f64)> = correlogram.lags[1..]
            .iter()
            .zip(&correlogram.half_widths[1..])
            .map(|(&k, &h)| (k as f64, h))
            .chain(
                correlogram.lags[1..]
                    .iter()
                    .zip(&correlogram.half_widths[1..])
                    .rev()
                    .map(|(&k, &h)| (k as f64, -h)),
            )
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(
                band,
                style.primary.mix(style.band_opacity).filled(),
            )))
            .map_err(render_err)?;
    }

    chart
        .draw_series(LineSeries::new(
            vec![(-0.5, 0.0), (max_lag + 0.5, 0.0)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;

    let color = style.primary;
    chart
        .draw_series(
            correlogram
                .lags
                .iter()
                .zip(&correlogram.values)
                .map(|(&k, &v)| PathElement::new(vec![(k as f64, 0.0), (k as f64, v)], color.stroke_width(2))),
        )
        .map_err(render_err)?;
    chart
        .draw_series(
            correlogram
                .lags
                .iter()
                .zip(&correlogram.values)
                .map(|(&k, &v)| Circle::new((k as f64, v), 4, color.filled())),
        )
        .map_err(render_err)?;

    Ok(())
}

/// Stem plot of a correlogram with its confidence band around zero.
pub fn plot_correlogram(
    path: impl AsRef<Path>,
    correlogram: &Correlogram,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    if correlogram.values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let root = open(path.as_ref(), style)?;
    correlogram_panel(&root, correlogram, title, style)?;
    root.present().map_err(render_err)
}

/// ACF and PACF side by side.
pub fn plot_acf_pacf(
    path: impl AsRef<Path>,
    series: &[f64],
    lags: usize,
    alpha: f64,
    title: &str,
    style: &PlotStyle,
) -> Result<()> {
    if series.len() < 4 {
        return Err(ForecastError::InsufficientData {
            needed: 4,
            got: series.len(),
        });
    }
    let acf = acf_with_confint(series, lags, alpha);
    let pacf = pacf_with_confint(series, lags, alpha);

    let root = open(path.as_ref(), style)?;
    let root = root
        .titled(title, ("sans-serif", style.title_font_size + 4))
        .map_err(render_err)?;
    let panels = root.split_evenly((1, 2));
    correlogram_panel(&panels[0], &acf, "Autocorrelation (ACF)", style)?;
    correlogram_panel(&panels[1], &pacf, "Partial autocorrelation (PACF)", style)?;
    root.present().map_err(render_err)
}

/// Full series on top; train, validation and test segments below with
/// vertical markers at the cut points.
pub fn plot_train_test_split(
    path: impl AsRef<Path>,
    original: &TimeSeries,
    split: &SplitResult,
    title_prefix: &str,
    style: &PlotStyle,
) -> Result<()> {
    let root = open(path.as_ref(), style)?;
    let panels = root.split_evenly((2, 1));

    series_panel(&panels[0], original, &format!("{} - Full series", title_prefix), style)?;

    let x = time_range(original.timestamps())?;
    let y = value_range(original.primary_values());
    let mut chart = time_chart(
        &panels[1],
        &format!("{} - Train/Validation/Test split", title_prefix),
        x,
        y.clone(),
        style,
    )?;

    let train = split.train();
    draw_line(&mut chart, points(train.timestamps(), train.primary_values()), style.primary, "Train")?;

    if let Some(validation) = split.validation() {
        draw_line(
            &mut chart,
            points(validation.timestamps(), validation.primary_values()),
            style.secondary,
            "Validation",
        )?;
        if let Some(start) = validation.start() {
            draw_vertical(&mut chart, start, &y, "Validation start")?;
        }
    }

    let test = split.test();
    draw_line(&mut chart, points(test.timestamps(), test.primary_values()), style.accent, "Test")?;
    if let Some(start) = test.start() {
        draw_vertical(&mut chart, start, &y, "Test start")?;
    }

    draw_legend(&mut chart)?;
    root.present().map_err(render_err)
}

/// Series with its smoother on the left, the residual on the right.
pub fn plot_smoothing_residual(
    path: impl AsRef<Path>,
    observed: &TimeSeries,
    result: &SmoothingResidual,
    smoother: &str,
    style: &PlotStyle,
) -> Result<()> {
    let root = open(path.as_ref(), style)?;
    let panels = root.split_evenly((1, 2));

    let x = time_range(observed.timestamps())?;
    let y = value_range(
        observed
            .primary_values()
            .iter()
            .chain(result.smoothed.primary_values()),
    );
    let mut chart = time_chart(&panels[0], &format!("Series and {}", smoother), x.clone(), y, style)?;
    draw_line(
        &mut chart,
        points(observed.timestamps(), observed.primary_values()),
        style.primary,
        "Series",
    )?;
    draw_line(
        &mut chart,
        points(result.smoothed.timestamps(), result.smoothed.primary_values()),
        style.secondary,
        smoother,
    )?;
    draw_legend(&mut chart)?;

    let y = value_range(result.residual.primary_values().iter().chain(&[0.0]));
    let mut chart = time_chart(&panels[1], &format!("Residual ({})", smoother), x, y, style)?;
    draw_line(
        &mut chart,
        points(result.residual.timestamps(), result.residual.primary_values()),
        style.accent,
        "Residual",
    )?;
    draw_legend(&mut chart)?;

    root.present().map_err(render_err)
}
