//! Histogram charts of numeric columns.
//!
//! Each selected column is bucketed over its own `[min, max]` range and the
//! series are drawn overlaid with translucent bars on a 640 × 480 canvas.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::models::Dataset;
use crate::render::{generate_palette, text_width, Align, Canvas, BLACK, GRID_GRAY, WHITE};

pub const DEFAULT_BUCKETS: usize = 20;

pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 480;

const PLOT_LEFT: u32 = 64;
const PLOT_RIGHT: u32 = 24;
const PLOT_TOP: u32 = 48;
const PLOT_BOTTOM: u32 = 56;

const BAR_ALPHA: f32 = 0.5;
const LABEL_SCALE: u32 = 1;
const TITLE_SCALE: u32 = 2;

/// Which columns to chart and how finely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Columns to chart; empty means every numeric column.
    pub columns: Vec<String>,
    pub buckets: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            buckets: DEFAULT_BUCKETS,
        }
    }
}

impl ChartOptions {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }
}

/// Bucket counts of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bucket `values` into `buckets` equal-width bins over their range.
    ///
    /// A constant column gets the range `[v - 0.5, v + 0.5]`. The maximum
    /// lands in the last bucket.
    fn build(column: &str, values: &[f64], buckets: usize) -> Self {
        let (mut min, mut max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if min == max {
            min -= 0.5;
            max += 0.5;
        }

        let mut counts = vec![0usize; buckets];
        for v in values {
            let idx = match range_fraction(*v, min, max) {
                Some(t) => ((t * buckets as f64).floor() as usize).min(buckets - 1),
                // Too large to widen: the range is still a single point.
                None => buckets / 2,
            };
            counts[idx] += 1;
        }

        Self {
            column: column.to_string(),
            min,
            max,
            counts,
        }
    }

    /// Infinite when the range itself exceeds `f64::MAX`.
    pub fn bucket_width(&self) -> f64 {
        (self.max / 2.0 - self.min / 2.0) / self.counts.len() as f64 * 2.0
    }

    /// Bucket boundaries, one more than the bucket count.
    pub fn edges(&self) -> Vec<f64> {
        let n = self.counts.len() as f64;
        (0..=self.counts.len())
            .map(|i| {
                let f = i as f64 / n;
                self.min * (1.0 - f) + self.max * f
            })
            .collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Position of `v` in `[min, max]` as a fraction in `[0, 1]`.
///
/// Halved operands keep `max - min` finite for any pair of finite values.
/// `None` for an empty range.
fn range_fraction(v: f64, min: f64, max: f64) -> Option<f64> {
    let span = max / 2.0 - min / 2.0;
    if span > 0.0 {
        Some(((v / 2.0 - min / 2.0) / span).clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Resolve the column selection and bucket every selected column.
pub fn histograms(dataset: &Dataset, options: &ChartOptions) -> ChartResult<Vec<Histogram>> {
    if options.buckets == 0 {
        return Err(ChartError::InvalidBucketCount);
    }

    let numeric = dataset.numeric_columns();
    if numeric.is_empty() {
        return Err(ChartError::NoNumericColumns);
    }

    let selected: Vec<&str> = if options.columns.is_empty() {
        numeric
    } else {
        options
            .columns
            .iter()
            .map(|name| {
                if numeric.contains(&name.as_str()) {
                    Ok(name.as_str())
                } else {
                    Err(ChartError::InvalidColumnSelection(name.clone()))
                }
            })
            .collect::<ChartResult<_>>()?
    };

    Ok(selected
        .into_iter()
        .filter_map(|name| dataset.column(name))
        .map(|column| Histogram::build(&column.name, &column.numeric_values(), options.buckets))
        .collect())
}

/// Draw the overlaid histograms.
pub fn histogram_canvas(dataset: &Dataset, options: &ChartOptions) -> ChartResult<Canvas> {
    let series = histograms(dataset, options)?;
    let colors = generate_palette(series.len());

    let mut canvas = Canvas::new(CHART_WIDTH, CHART_HEIGHT);
    let plot_w = CHART_WIDTH - PLOT_LEFT - PLOT_RIGHT;
    let plot_h = CHART_HEIGHT - PLOT_TOP - PLOT_BOTTOM;
    let plot_x = PLOT_LEFT as i64;
    let plot_y = PLOT_TOP as i64;
    let plot_bottom = plot_y + plot_h as i64;

    canvas.draw_text_in_box(0, 8, CHART_WIDTH, 32, "Histogram", TITLE_SCALE, Align::Center, BLACK);

    let max_count = series
        .iter()
        .flat_map(|h| h.counts.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);

    // Horizontal guides at quarters of the count axis.
    for i in 1..=4 {
        let y = plot_bottom - (plot_h as i64 * i) / 4;
        canvas.hline(plot_x, y, plot_w, GRID_GRAY);
    }

    for (histogram, color) in series.iter().zip(&colors) {
        let buckets = histogram.counts.len() as u32;
        for (i, count) in histogram.counts.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            let x0 = plot_x + (plot_w * i as u32 / buckets) as i64;
            let x1 = plot_x + (plot_w * (i as u32 + 1) / buckets) as i64;
            let bar_h = ((*count as f64 / max_count as f64) * plot_h as f64).round() as u32;
            let bar_w = (x1 - x0).max(1) as u32;
            let y = plot_bottom - bar_h as i64;
            canvas.blend_rect(x0, y, bar_w, bar_h, *color, BAR_ALPHA);
            canvas.stroke_rect(x0, y, bar_w, bar_h, *color);
        }
    }

    // Axes
    canvas.vline(plot_x, plot_y, plot_h + 1, BLACK);
    canvas.hline(plot_x, plot_bottom, plot_w, BLACK);

    // Count ticks
    let label_h = 8 * LABEL_SCALE as i64;
    for (value, y) in [(0, plot_bottom), (max_count, plot_y)] {
        let label = value.to_string();
        let w = text_width(&label, LABEL_SCALE) as i64;
        canvas.hline(plot_x - 4, y, 4, BLACK);
        canvas.draw_text(plot_x - 8 - w, y - label_h / 2, &label, LABEL_SCALE, BLACK);
    }

    // Value ticks, shared when a single series is drawn.
    if let [only] = series.as_slice() {
        let low = format_value(only.min);
        let high = format_value(only.max);
        let high_w = text_width(&high, LABEL_SCALE) as i64;
        let right = plot_x + plot_w as i64 - 1;
        canvas.vline(plot_x, plot_bottom, 4, BLACK);
        canvas.vline(right, plot_bottom, 4, BLACK);
        canvas.draw_text(plot_x, plot_bottom + 8, &low, LABEL_SCALE, BLACK);
        canvas.draw_text(right - high_w + 1, plot_bottom + 8, &high, LABEL_SCALE, BLACK);
    }
    canvas.draw_text_in_box(
        plot_x,
        plot_bottom + 24,
        plot_w,
        24,
        "value",
        LABEL_SCALE,
        Align::Center,
        BLACK,
    );

    draw_legend(&mut canvas, &series, &colors, plot_x + plot_w as i64);

    Ok(canvas)
}

/// Legend in the top-right corner of the plot: one swatch and label per
/// series, with the series range.
fn draw_legend(canvas: &mut Canvas, series: &[Histogram], colors: &[image::Rgb<u8>], right: i64) {
    let line_h = 14i64;
    let swatch = 10u32;
    let labels: Vec<String> = series
        .iter()
        .map(|h| format!("{} [{}, {}]", h.column, format_value(h.min), format_value(h.max)))
        .collect();
    let widest = labels
        .iter()
        .map(|l| text_width(l, LABEL_SCALE))
        .max()
        .unwrap_or(0) as i64;

    let box_w = widest + swatch as i64 + 16;
    let box_h = labels.len() as i64 * line_h + 8;
    let x = right - box_w - 8;
    let y = PLOT_TOP as i64 + 8;

    canvas.fill_rect(x, y, box_w as u32, box_h as u32, WHITE);
    canvas.stroke_rect(x, y, box_w as u32, box_h as u32, GRID_GRAY);

    for (i, (label, color)) in labels.iter().zip(colors).enumerate() {
        let row_y = y + 4 + i as i64 * line_h;
        canvas.blend_rect(x + 4, row_y + 1, swatch, swatch, *color, BAR_ALPHA);
        canvas.stroke_rect(x + 4, row_y + 1, swatch, swatch, *color);
        canvas.draw_text(x + 8 + swatch as i64, row_y + 2, label, LABEL_SCALE, BLACK);
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Render the histogram chart as PNG bytes.
pub fn render_histogram_png(dataset: &Dataset, options: &ChartOptions) -> ChartResult<Vec<u8>> {
    let canvas = histogram_canvas(dataset, options)?;
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas.into_image()).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
