//! Static Chart Renderer
//! Draws each derived view to a PNG file with plotters.
//!
//! The renderer only consumes already-aggregated data; it never reaches
//! back into the dataframes. Each method writes one artifact and returns
//! its path, and a failure in one chart leaves the others unaffected.

use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::{Boxplot, Pie};
use plotters::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

use crate::charts::style::{ChartStyle, KDE_RED, SKY_BLUE};
use crate::stats::{
    Aggregator, CrossTab, StatsCalculator, AREA_DISPLAY_MAX, TOTAL_PRICE_DISPLAY_MAX,
};

const HISTOGRAM_BINS: usize = 50;
const KDE_GRID_POINTS: usize = 200;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to draw chart: {0}")]
    Drawing(String),
    #[error("nothing to draw for {0}")]
    EmptyChart(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Drawing(err.to_string())
    }
}

/// Writes the chart PNGs for the analysis run.
pub struct ChartRenderer {
    out_dir: PathBuf,
    style: ChartStyle,
}

impl ChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, style: ChartStyle) -> Self {
        Self {
            out_dir: out_dir.into(),
            style,
        }
    }

    fn target(&self, name: &str) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(&self.out_dir)?;
        Ok(self.out_dir.join(name))
    }

    fn font(&self) -> &str {
        self.style.font_family.as_str()
    }

    /// Histogram of unit prices with a KDE overlay on a secondary axis.
    pub fn price_histogram(&self, prices: &[f64]) -> Result<PathBuf, RenderError> {
        let path = self.target("price_distribution.png")?;
        let (bin_width, min, counts) = Self::histogram_bins(prices, HISTOGRAM_BINS)
            .ok_or(RenderError::EmptyChart("price histogram"))?;
        let x_max = min + bin_width * counts.len() as f64;
        let y_max = counts.iter().copied().max().unwrap_or(1).max(1);

        let kde = StatsCalculator::kde_curve(prices, KDE_GRID_POINTS);
        let kde_max = kde
            .iter()
            .map(|&(_, d)| d)
            .fold(f64::MIN_POSITIVE, f64::max);

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Unit Price Distribution", (self.font(), 28))
            .margin(12)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .right_y_label_area_size(70)
            .build_cartesian_2d(min..x_max, 0u32..(y_max + y_max / 10 + 1))?
            .set_secondary_coord(min..x_max, 0f64..kde_max * 1.1);

        chart
            .configure_mesh()
            .x_desc("Unit price (yuan/m²)")
            .y_desc("Listings")
            .draw()?;
        chart.configure_secondary_axes().y_desc("Density").draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = min + bin_width * i as f64;
            let mut bar =
                Rectangle::new([(x0, 0), (x0 + bin_width, count)], SKY_BLUE.mix(0.7).filled());
            bar.set_margin(0, 0, 0, 1);
            bar
        }))?;

        if !kde.is_empty() {
            chart
                .draw_secondary_series(LineSeries::new(
                    kde.iter().copied(),
                    KDE_RED.stroke_width(2),
                ))?
                .label("KDE")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], KDE_RED.stroke_width(2))
                });
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(path.clone())
    }

    /// Bar chart of median unit price per district, bars already ordered
    /// descending by the aggregator, value label above each bar.
    pub fn district_median_bars(
        &self,
        medians: &[(String, f64)],
    ) -> Result<PathBuf, RenderError> {
        let path = self.target("district_median_price.png")?;
        if medians.is_empty() {
            return Err(RenderError::EmptyChart("district medians"));
        }
        let y_max = medians.iter().map(|&(_, v)| v).fold(0.0, f64::max) * 1.12;
        let labels: Vec<String> = medians.iter().map(|(d, _)| d.clone()).collect();

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Median Unit Price by District", (self.font(), 28))
            .margin(12)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d((0..medians.len()).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(medians.len())
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("District")
            .y_desc("Median unit price (yuan/m²)")
            .draw()?;

        chart.draw_series(medians.iter().enumerate().map(|(i, &(_, value))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), value),
                ],
                self.style.color(i).mix(0.85).filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))?;

        chart.draw_series(medians.iter().enumerate().map(|(i, &(_, value))| {
            Text::new(
                format!("{value:.0}"),
                (SegmentValue::CenterOf(i), value + y_max * 0.015),
                (self.font(), 13).into_font(),
            )
        }))?;

        root.present()?;
        Ok(path.clone())
    }

    /// Scatter of built area against total price with an OLS fit line.
    /// Axes are fixed to the display window; the fit uses every pair.
    pub fn area_price_scatter(&self, pairs: &[(f64, f64)]) -> Result<PathBuf, RenderError> {
        let path = self.target("area_vs_total_price.png")?;
        if pairs.is_empty() {
            return Err(RenderError::EmptyChart("area/price scatter"));
        }
        let visible = Aggregator::clip_to_display(pairs);

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Total Price vs Built Area", (self.font(), 28))
            .margin(12)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(0f64..AREA_DISPLAY_MAX, 0f64..TOTAL_PRICE_DISPLAY_MAX)?;

        chart
            .configure_mesh()
            .x_desc("Built area (m²)")
            .y_desc("Total price (10k yuan)")
            .draw()?;

        chart.draw_series(
            visible
                .iter()
                .map(|&(a, p)| Circle::new((a, p), 3, BLUE.mix(0.4).filled())),
        )?;

        if let Some((slope, intercept)) = StatsCalculator::linear_fit(pairs) {
            // Sample the fit line and keep only the part inside the window
            let fit: Vec<(f64, f64)> = (0..=100)
                .map(|i| {
                    let x = AREA_DISPLAY_MAX * i as f64 / 100.0;
                    (x, slope * x + intercept)
                })
                .filter(|&(_, y)| (0.0..=TOTAL_PRICE_DISPLAY_MAX).contains(&y))
                .collect();
            if fit.len() > 1 {
                chart
                    .draw_series(LineSeries::new(fit, KDE_RED.stroke_width(2)))?
                    .label("OLS fit")
                    .legend(|(x, y)| {
                        PathElement::new(vec![(x, y), (x + 16, y)], KDE_RED.stroke_width(2))
                    });
                chart
                    .configure_series_labels()
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&BLACK)
                    .draw()?;
            }
        }

        root.present()?;
        Ok(path.clone())
    }

    /// One annotated heat cell per district, colored by mean unit price.
    pub fn district_mean_heatmap(
        &self,
        means: &[(String, f64)],
    ) -> Result<PathBuf, RenderError> {
        let path = self.target("district_mean_heatmap.png")?;
        if means.is_empty() {
            return Err(RenderError::EmptyChart("district mean heatmap"));
        }
        let min = means.iter().map(|&(_, v)| v).fold(f64::INFINITY, f64::min);
        let max = means
            .iter()
            .map(|&(_, v)| v)
            .fold(f64::NEG_INFINITY, f64::max);
        let span = (max - min).max(f64::MIN_POSITIVE);
        let labels: Vec<String> = means.iter().map(|(d, _)| d.clone()).collect();

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height / 2))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Mean Unit Price by District", (self.font(), 28))
            .margin(12)
            .x_label_area_size(60)
            .y_label_area_size(10)
            .build_cartesian_2d(
                (0..means.len()).into_segmented(),
                (0..1usize).into_segmented(),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(means.len())
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .y_labels(0)
            .x_desc("District")
            .draw()?;

        chart.draw_series(means.iter().enumerate().map(|(i, &(_, value))| {
            let t = (value - min) / span;
            Rectangle::new(
                [
                    (SegmentValue::Exact(i), SegmentValue::Exact(0)),
                    (SegmentValue::Exact(i + 1), SegmentValue::Exact(1)),
                ],
                ChartStyle::heat_color(t).filled(),
            )
        }))?;

        chart.draw_series(means.iter().enumerate().map(|(i, &(_, value))| {
            Text::new(
                format!("{value:.0}"),
                (SegmentValue::CenterOf(i), SegmentValue::CenterOf(0)),
                (self.font(), 14).into_font(),
            )
        }))?;

        root.present()?;
        Ok(path.clone())
    }

    /// Pie chart of decoration category shares with percentage labels.
    pub fn decoration_pie(&self, counts: &[(String, u64)]) -> Result<PathBuf, RenderError> {
        let path = self.target("decoration_share.png")?;
        if counts.is_empty() {
            return Err(RenderError::EmptyChart("decoration pie"));
        }

        let side = self.style.width.min(self.style.height).max(400);
        let root = BitMapBackend::new(&path, (side, side)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled("Decoration Status Share", (self.font(), 28))?;

        let sizes: Vec<f64> = counts.iter().map(|&(_, c)| c as f64).collect();
        let labels: Vec<String> = counts.iter().map(|(l, _)| l.clone()).collect();
        let colors: Vec<RGBColor> = (0..counts.len()).map(|i| self.style.color(i)).collect();

        let center = ((side / 2) as i32, (side / 2) as i32);
        let radius = side as f64 * 0.3;
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(140.0);
        pie.label_style((self.font(), 18).into_font());
        pie.percentages((self.font(), 14).into_font().color(&BLACK));
        root.draw(&pie)?;

        root.present()?;
        Ok(path.clone())
    }

    /// Boxplot of unit prices per district (quartiles, 1.5 IQR whiskers).
    pub fn district_boxplot(
        &self,
        groups: &[(String, Vec<f64>)],
    ) -> Result<PathBuf, RenderError> {
        let path = self.target("district_unit_price_boxplot.png")?;
        if groups.is_empty() {
            return Err(RenderError::EmptyChart("district boxplot"));
        }
        let all_max = groups
            .iter()
            .flat_map(|(_, v)| v.iter().copied())
            .fold(f64::NEG_INFINITY, f64::max);
        let all_min = groups
            .iter()
            .flat_map(|(_, v)| v.iter().copied())
            .fold(f64::INFINITY, f64::min);
        let pad = (all_max - all_min).max(1.0) * 0.08;
        let labels: Vec<String> = groups.iter().map(|(d, _)| d.clone()).collect();

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Unit Price Distribution by District", (self.font(), 28))
            .margin(12)
            .x_label_area_size(70)
            .y_label_area_size(80)
            .build_cartesian_2d(
                (0..groups.len()).into_segmented(),
                ((all_min - pad) as f32)..((all_max + pad) as f32),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups.len())
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_label_style(
                (self.font(), 12)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_desc("District")
            .y_desc("Unit price (yuan/m²)")
            .draw()?;

        chart.draw_series(groups.iter().enumerate().map(|(i, (_, values))| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i), &Quartiles::new(values))
                .width(26)
                .whisker_width(0.5)
                .style(self.style.color(i))
        }))?;

        root.present()?;
        Ok(path.clone())
    }

    /// Stacked bars of decoration counts per district, one layer per
    /// decoration category.
    pub fn decoration_stacked_bars(&self, table: &CrossTab) -> Result<PathBuf, RenderError> {
        let path = self.target("district_decoration_stacked.png")?;
        if table.districts.is_empty() || table.decorations.is_empty() {
            return Err(RenderError::EmptyChart("decoration stacked bars"));
        }
        let n = table.districts.len();
        let tallest = table
            .counts
            .iter()
            .map(|row| row.iter().sum::<u64>())
            .max()
            .unwrap_or(1)
            .max(1);
        let labels = table.districts.clone();

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Decoration Status by District", (self.font(), 28))
            .margin(12)
            .x_label_area_size(70)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..(tallest as f64 * 1.1))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_label_style(
                (self.font(), 12)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_desc("District")
            .y_desc("Listings")
            .draw()?;

        let mut base = vec![0u64; n];
        for (layer, decoration) in table.decorations.iter().enumerate() {
            let color = self.style.color(layer);
            chart
                .draw_series((0..n).map(|i| {
                    let y0 = base[i] as f64;
                    let y1 = (base[i] + table.counts[i][layer]) as f64;
                    let mut bar = Rectangle::new(
                        [
                            (SegmentValue::Exact(i), y0),
                            (SegmentValue::Exact(i + 1), y1),
                        ],
                        color.filled(),
                    );
                    bar.set_margin(0, 0, 8, 8);
                    bar
                }))?
                .label(decoration)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
            for i in 0..n {
                base[i] += table.counts[i][layer];
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(path.clone())
    }

    /// Line chart of mean unit price across districts with point markers.
    pub fn district_mean_line(&self, means: &[(String, f64)]) -> Result<PathBuf, RenderError> {
        let path = self.target("district_mean_price_line.png")?;
        if means.is_empty() {
            return Err(RenderError::EmptyChart("district mean line"));
        }
        let min = means.iter().map(|&(_, v)| v).fold(f64::INFINITY, f64::min);
        let max = means
            .iter()
            .map(|&(_, v)| v)
            .fold(f64::NEG_INFINITY, f64::max);
        let pad = (max - min).max(1.0) * 0.1;
        let labels: Vec<String> = means.iter().map(|(d, _)| d.clone()).collect();

        let root = BitMapBackend::new(&path, (self.style.width, self.style.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Mean Unit Price Across Districts", (self.font(), 28))
            .margin(12)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d((0..means.len()).into_segmented(), (min - pad)..(max + pad))?;

        chart
            .configure_mesh()
            .x_labels(means.len())
            .x_label_formatter(&|seg| match seg {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("District")
            .y_desc("Mean unit price (yuan/m²)")
            .draw()?;

        chart.draw_series(LineSeries::new(
            means
                .iter()
                .enumerate()
                .map(|(i, &(_, value))| (SegmentValue::CenterOf(i), value)),
            BLUE.stroke_width(2),
        ))?;

        chart.draw_series(means.iter().enumerate().map(|(i, &(_, value))| {
            Circle::new((SegmentValue::CenterOf(i), value), 4, BLUE.filled())
        }))?;

        root.present()?;
        Ok(path.clone())
    }

    /// Bin `values` into `bins` equal-width buckets over their range.
    /// Returns (bin width, range minimum, counts).
    fn histogram_bins(values: &[f64], bins: usize) -> Option<(f64, f64, Vec<u32>)> {
        if values.is_empty() || bins == 0 {
            return None;
        }
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let width = if max > min {
            (max - min) / bins as f64
        } else {
            1.0
        };
        let mut counts = vec![0u32; bins];
        for &v in values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some((width, min, counts))
    }
}
