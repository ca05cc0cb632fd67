//! SVG validation charts.
//!
//! Two charts are produced: a grouped bar chart comparing defect counts
//! before and after cleaning, and a 2x2 dashboard of the cleaned data
//! (age histogram, rating distribution, category shares, recommendation
//! counts).

use crate::error::{CleaningError, Result};
use crate::quality::QualityComparison;
use crate::types::{AGE, Dataset, PRODUCT_CATEGORY, SATISFACTION_RATING, WOULD_RECOMMEND};
use crate::utils::{int_values, text_values};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const QUALITY_CHART_FILE: &str = "data_quality_comparison.svg";
pub const ANALYSIS_CHART_FILE: &str = "data_cleaning_analysis.svg";

const BEFORE_COLOR: &str = "lightcoral";
const AFTER_COLOR: &str = "lightgreen";
const HISTOGRAM_COLOR: &str = "skyblue";
const CATEGORY_COLORS: [&str; 4] = ["lightcoral", "lightsalmon", "lightblue", "lightgreen"];
const RECOMMEND_COLORS: [&str; 2] = ["lightcoral", "lightgreen"];
const AGE_BINS: usize = 10;

/// Escape text for use in SVG content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn num(value: f64) -> String {
    format!("{:.2}", value)
}

/// Minimal SVG document builder.
pub struct SvgCanvas {
    width: f64,
    height: f64,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        let mut canvas = Self {
            width,
            height,
            body: String::new(),
        };
        canvas.rect(0.0, 0.0, width, height, "white", None);
        canvas
    }

    pub fn rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: &str,
        stroke: Option<&str>,
    ) {
        let stroke = stroke.map_or(String::new(), |s| format!(" stroke=\"{}\"", escape_xml(s)));
        self.body.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>\n",
            num(x),
            num(y),
            num(width.max(0.0)),
            num(height.max(0.0)),
            escape_xml(fill),
            stroke
        ));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) {
        self.body.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\"/>\n",
            num(x1),
            num(y1),
            num(x2),
            num(y2),
            escape_xml(stroke)
        ));
    }

    /// Text anchored at `(x, y)`; `anchor` is `start`, `middle` or `end`.
    pub fn text(&mut self, x: f64, y: f64, content: &str, size: u32, anchor: &str) {
        self.body.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"{}\" text-anchor=\"{}\">{}</text>\n",
            num(x),
            num(y),
            size,
            anchor,
            escape_xml(content)
        ));
    }

    /// Vertical text, rotated about its anchor point.
    pub fn vertical_text(&mut self, x: f64, y: f64, content: &str, size: u32) {
        self.body.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"{size}\" text-anchor=\"middle\" transform=\"rotate(-90 {x} {y})\">{}</text>\n",
            escape_xml(content),
            x = num(x),
            y = num(y),
        ));
    }

    pub fn path(&mut self, d: &str, fill: &str, stroke: &str) {
        self.body.push_str(&format!(
            "<path d=\"{}\" fill=\"{}\" stroke=\"{}\"/>\n",
            d,
            escape_xml(fill),
            escape_xml(stroke)
        ));
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str, stroke: &str) {
        self.body.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"{}\"/>\n",
            num(cx),
            num(cy),
            num(r),
            escape_xml(fill),
            escape_xml(stroke)
        ));
    }

    /// Close the document.
    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{}</svg>\n",
            self.body,
            w = num(self.width),
            h = num(self.height),
        )
    }
}

/// Plot area of one chart panel.
#[derive(Debug, Clone, Copy)]
struct Area {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Area {
    fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// A bar: label, value and fill color.
struct Bar<'a> {
    label: String,
    value: f64,
    color: &'a str,
}

/// Round an axis maximum up to a readable value.
fn axis_max(max: f64) -> f64 {
    if max <= 0.0 {
        return 1.0;
    }
    if max <= 10.0 {
        return max.ceil();
    }
    let magnitude = 10f64.powf(max.log10().floor());
    (max / magnitude).ceil() * magnitude
}

fn draw_axes(canvas: &mut SvgCanvas, area: Area, y_max: f64, x_label: &str, y_label: &str) {
    canvas.line(area.x, area.bottom(), area.x + area.width, area.bottom(), "black");
    canvas.line(area.x, area.y, area.x, area.bottom(), "black");

    let ticks = if y_max <= 10.0 { y_max as usize } else { 5 };
    for i in 0..=ticks {
        let value = y_max * i as f64 / ticks.max(1) as f64;
        let y = area.bottom() - area.height * value / y_max;
        canvas.line(area.x - 4.0, y, area.x, y, "black");
        canvas.text(area.x - 8.0, y + 4.0, &format!("{}", value.round() as i64), 11, "end");
    }

    canvas.text(area.x + area.width / 2.0, area.bottom() + 40.0, x_label, 13, "middle");
    canvas.vertical_text(area.x - 40.0, area.y + area.height / 2.0, y_label, 13);
}

fn draw_bars(canvas: &mut SvgCanvas, area: Area, bars: &[Bar<'_>], x_label: &str, y_label: &str) {
    let y_max = axis_max(bars.iter().map(|b| b.value).fold(0.0, f64::max));
    draw_axes(canvas, area, y_max, x_label, y_label);
    if bars.is_empty() {
        return;
    }

    let slot = area.width / bars.len() as f64;
    let bar_width = slot * 0.6;
    for (i, bar) in bars.iter().enumerate() {
        let height = area.height * bar.value / y_max;
        let x = area.x + slot * i as f64 + (slot - bar_width) / 2.0;
        canvas.rect(x, area.bottom() - height, bar_width, height, bar.color, Some("black"));
        canvas.text(x + bar_width / 2.0, area.bottom() + 16.0, &bar.label, 11, "middle");
    }
}

/// Equal-width histogram bins `(lower, upper, count)` over the value range.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (min + width * i as f64, min + width * (i + 1) as f64, count))
        .collect()
}

fn draw_histogram(canvas: &mut SvgCanvas, area: Area, values: &[f64]) {
    let bins = histogram(values, AGE_BINS);
    let y_max = axis_max(bins.iter().map(|b| b.2 as f64).fold(0.0, f64::max));
    draw_axes(canvas, area, y_max, "Age", "Customer Count");
    if bins.is_empty() {
        return;
    }

    let bin_width = area.width / bins.len() as f64;
    for (i, (lower, _, count)) in bins.iter().enumerate() {
        let height = area.height * *count as f64 / y_max;
        let x = area.x + bin_width * i as f64;
        canvas.rect(
            x,
            area.bottom() - height,
            bin_width,
            height,
            HISTOGRAM_COLOR,
            Some("black"),
        );
        canvas.text(x, area.bottom() + 16.0, &format!("{:.0}", lower), 10, "middle");
    }
    if let Some((_, upper, _)) = bins.last() {
        canvas.text(
            area.x + area.width,
            area.bottom() + 16.0,
            &format!("{:.0}", upper),
            10,
            "middle",
        );
    }
}

fn draw_pie(canvas: &mut SvgCanvas, cx: f64, cy: f64, r: f64, slices: &[(String, usize)]) {
    let total: usize = slices.iter().map(|(_, n)| n).sum();
    if total == 0 {
        canvas.text(cx, cy, "No data", 13, "middle");
        return;
    }

    let mut start = -PI / 2.0;
    for (i, (label, count)) in slices.iter().enumerate() {
        let fraction = *count as f64 / total as f64;
        let sweep = fraction * 2.0 * PI;
        let color = CATEGORY_COLORS[i % CATEGORY_COLORS.len()];

        if fraction >= 0.9999 {
            canvas.circle(cx, cy, r, color, "white");
        } else {
            let end = start + sweep;
            let large_arc = if sweep > PI { 1 } else { 0 };
            let d = format!(
                "M {} {} L {} {} A {} {} 0 {} 1 {} {} Z",
                num(cx),
                num(cy),
                num(cx + r * start.cos()),
                num(cy + r * start.sin()),
                num(r),
                num(r),
                large_arc,
                num(cx + r * end.cos()),
                num(cy + r * end.sin())
            );
            canvas.path(&d, color, "white");
        }

        let mid = start + sweep / 2.0;
        canvas.text(
            cx + r * 0.6 * mid.cos(),
            cy + r * 0.6 * mid.sin() + 4.0,
            &format!("{:.1}%", fraction * 100.0),
            11,
            "middle",
        );
        let anchor = if mid.cos() >= 0.0 { "start" } else { "end" };
        canvas.text(
            cx + r * 1.12 * mid.cos(),
            cy + r * 1.12 * mid.sin() + 4.0,
            label,
            12,
            anchor,
        );

        start += sweep;
    }
}

/// Count values, most frequent first; ties in alphabetical order.
fn value_counts(values: impl IntoIterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Renders and saves the validation charts.
pub struct ChartRenderer {
    output_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Grouped bar chart of defect counts before and after cleaning.
    pub fn quality_comparison_svg(comparison: &QualityComparison) -> String {
        let (width, height) = (900.0, 520.0);
        let mut canvas = SvgCanvas::new(width, height);
        canvas.text(width / 2.0, 32.0, "Data Quality: Before vs After Cleaning", 18, "middle");
        canvas.text(
            width / 2.0,
            54.0,
            &format!(
                "Quality score {:.1} -> {:.1}",
                comparison.before.quality_score(),
                comparison.after.quality_score()
            ),
            12,
            "middle",
        );

        let area = Area {
            x: 80.0,
            y: 80.0,
            width: width - 120.0,
            height: height - 160.0,
        };
        let categories = comparison.categories();
        let y_max = axis_max(
            categories
                .iter()
                .map(|(_, before, after)| (*before).max(*after) as f64)
                .fold(0.0, f64::max),
        );
        draw_axes(&mut canvas, area, y_max, "Issue Type", "Count");

        let slot = area.width / categories.len() as f64;
        let bar_width = slot * 0.35;
        for (i, (label, before, after)) in categories.iter().enumerate() {
            let x = area.x + slot * i as f64 + slot * 0.15;
            let pair = [(0.0, *before, BEFORE_COLOR), (bar_width, *after, AFTER_COLOR)];
            for (offset, value, color) in pair {
                let h = area.height * value as f64 / y_max;
                canvas.rect(x + offset, area.bottom() - h, bar_width, h, color, Some("black"));
                canvas.text(
                    x + offset + bar_width / 2.0,
                    area.bottom() - h - 4.0,
                    &value.to_string(),
                    11,
                    "middle",
                );
            }
            canvas.text(x + bar_width, area.bottom() + 16.0, label, 12, "middle");
        }

        let legend_x = area.x + area.width - 160.0;
        let legend = [("Before Cleaning", BEFORE_COLOR), ("After Cleaning", AFTER_COLOR)];
        for (i, (label, color)) in legend.into_iter().enumerate() {
            let y = area.y + 20.0 * i as f64;
            canvas.rect(legend_x, y, 14.0, 14.0, color, Some("black"));
            canvas.text(legend_x + 20.0, y + 12.0, label, 12, "start");
        }

        canvas.finish()
    }

    /// Four-panel dashboard of the cleaned dataset.
    pub fn analysis_dashboard_svg(dataset: &Dataset) -> Result<String> {
        let df = dataset.frame();
        let ages: Vec<f64> = int_values(df, AGE)?
            .into_iter()
            .flatten()
            .map(|v| v as f64)
            .collect();
        let ratings: Vec<i64> = int_values(df, SATISFACTION_RATING)?
            .into_iter()
            .flatten()
            .collect();
        let categories = value_counts(text_values(df, PRODUCT_CATEGORY)?.into_iter().flatten());
        let recommendations =
            value_counts(text_values(df, WOULD_RECOMMEND)?.into_iter().flatten());

        let (width, height) = (1200.0, 840.0);
        let (panel_w, panel_h) = (width / 2.0, (height - 40.0) / 2.0);
        let mut canvas = SvgCanvas::new(width, height);
        canvas.text(width / 2.0, 28.0, "Survey Data After Cleaning", 18, "middle");

        let panel = |col: f64, row: f64| -> (f64, f64) { (col * panel_w, 40.0 + row * panel_h) };
        let plot = |(x, y): (f64, f64)| Area {
            x: x + 80.0,
            y: y + 50.0,
            width: panel_w - 120.0,
            height: panel_h - 110.0,
        };

        // Age distribution
        let origin = panel(0.0, 0.0);
        canvas.text(
            origin.0 + panel_w / 2.0,
            origin.1 + 30.0,
            "Age Distribution (Post-Cleaning)",
            14,
            "middle",
        );
        draw_histogram(&mut canvas, plot(origin), &ages);

        // Satisfaction ratings
        let origin = panel(1.0, 0.0);
        canvas.text(
            origin.0 + panel_w / 2.0,
            origin.1 + 30.0,
            "Customer Satisfaction Ratings",
            14,
            "middle",
        );
        let rating_bars: Vec<Bar<'_>> = (1..=5)
            .map(|rating| Bar {
                label: rating.to_string(),
                value: ratings.iter().filter(|r| **r == rating).count() as f64,
                color: AFTER_COLOR,
            })
            .collect();
        draw_bars(&mut canvas, plot(origin), &rating_bars, "Rating (1-5 Scale)", "Count");

        // Product categories
        let origin = panel(0.0, 1.0);
        canvas.text(
            origin.0 + panel_w / 2.0,
            origin.1 + 30.0,
            "Product Category Distribution",
            14,
            "middle",
        );
        let radius = (panel_h - 120.0) / 2.0;
        draw_pie(
            &mut canvas,
            origin.0 + panel_w / 2.0,
            origin.1 + 50.0 + radius + 10.0,
            radius,
            &categories,
        );

        // Recommendations
        let origin = panel(1.0, 1.0);
        canvas.text(
            origin.0 + panel_w / 2.0,
            origin.1 + 30.0,
            "Customer Recommendation Willingness",
            14,
            "middle",
        );
        let recommend_bars: Vec<Bar<'_>> = recommendations
            .into_iter()
            .enumerate()
            .map(|(i, (label, count))| Bar {
                label,
                value: count as f64,
                color: RECOMMEND_COLORS[i % RECOMMEND_COLORS.len()],
            })
            .collect();
        draw_bars(&mut canvas, plot(origin), &recommend_bars, "Would Recommend", "Count");

        Ok(canvas.finish())
    }

    /// Render both charts into the output directory.
    pub fn render_all(
        &self,
        comparison: &QualityComparison,
        cleaned: &Dataset,
    ) -> Result<Vec<PathBuf>> {
        let quality = Self::quality_comparison_svg(comparison);
        let analysis =
            Self::analysis_dashboard_svg(cleaned).map_err(|e| CleaningError::ChartRendering {
                chart: ANALYSIS_CHART_FILE.to_string(),
                reason: e.to_string(),
            })?;

        Ok(vec![
            self.save(QUALITY_CHART_FILE, &quality)?,
            self.save(ANALYSIS_CHART_FILE, &analysis)?,
        ])
    }

    fn save(&self, file_name: &str, svg: &str) -> Result<PathBuf> {
        let chart_error = |e: std::io::Error| CleaningError::ChartRendering {
            chart: file_name.to_string(),
            reason: e.to_string(),
        };
        fs::create_dir_all(&self.output_dir).map_err(chart_error)?;
        let path = self.output_dir.join(file_name);
        fs::write(&path, svg).map_err(chart_error)?;
        info!("Chart saved: {}", path.display());
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::Cleaner;
    use crate::config::CleaningConfig;
    use crate::loader::DatasetLoader;
    use crate::quality::QualityMetrics;

    fn cleaned_sample() -> (QualityComparison, Dataset) {
        let config = CleaningConfig::default();
        let raw = DatasetLoader::load_embedded().unwrap();
        let before = QualityMetrics::assess(&raw, &config).unwrap();
        let cleaned = Cleaner::new(config.clone()).unwrap().clean(raw).unwrap().dataset;
        let after = QualityMetrics::assess(&cleaned, &config).unwrap();
        (QualityComparison::new(before, after), cleaned)
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Home & Garden"), "Home &amp; Garden");
        assert_eq!(escape_xml("<b>\"x\"</b>"), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_histogram_bins() {
        let bins = histogram(&[25.0, 30.0, 30.0, 30.0, 35.0], 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), 5);
        assert_eq!(bins[0], (25.0, 26.0, 1));
        assert_eq!(bins[5].2, 3);
        assert_eq!(bins[9].2, 1);
    }

    #[test]
    fn test_histogram_single_value_and_empty() {
        let bins = histogram(&[40.0, 40.0], 10);
        assert_eq!(bins[0].2, 2);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_axis_max() {
        assert_eq!(axis_max(0.0), 1.0);
        assert_eq!(axis_max(3.2), 4.0);
        assert_eq!(axis_max(42.0), 50.0);
    }

    #[test]
    fn test_value_counts_order() {
        let counts = value_counts(["No", "Yes", "Yes"].iter().map(|s| s.to_string()));
        assert_eq!(counts, vec![("Yes".to_string(), 2), ("No".to_string(), 1)]);
    }

    #[test]
    fn test_quality_chart_contents() {
        let (comparison, _) = cleaned_sample();
        let svg = ChartRenderer::quality_comparison_svg(&comparison);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Missing Values"));
        assert!(svg.contains(BEFORE_COLOR));
        assert!(svg.contains(AFTER_COLOR));
    }

    #[test]
    fn test_dashboard_contents() {
        let (_, cleaned) = cleaned_sample();
        let svg = ChartRenderer::analysis_dashboard_svg(&cleaned).unwrap();
        assert!(svg.contains("Age Distribution (Post-Cleaning)"));
        assert!(svg.contains("Home &amp; Garden"));
        assert!(svg.contains("40.0%"));
        assert!(svg.contains(HISTOGRAM_COLOR));
        assert!(!svg.contains("Home & Garden"));
    }

    #[test]
    fn test_render_all_writes_files() {
        let (comparison, cleaned) = cleaned_sample();
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path().join("charts"));

        let paths = renderer.render_all(&comparison, &cleaned).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_file()));
        assert!(paths[0].ends_with(QUALITY_CHART_FILE));
    }
}
