//! Aggregator Module
//! The derived views feeding each chart, one pure function per view.
//!
//! Every function takes the frame it consumes explicitly; callers decide
//! whether to pass the raw or the cleaned variant and the choice is visible
//! at the call site. Views are recomputed fresh per chart and never mutate
//! their input.

use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

use crate::data::{COL_BUILT_AREA, COL_DECORATION, COL_DISTRICT, COL_TOTAL_PRICE, COL_UNIT_PRICE};
use crate::stats::StatsCalculator;

/// Display window for the area/total-price scatter. The clip is applied
/// when drawing only; the regression fit still sees every pair.
pub const AREA_DISPLAY_MAX: f64 = 1000.0;
pub const TOTAL_PRICE_DISPLAY_MAX: f64 = 15000.0;

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("no usable values in column '{0}'")]
    EmptyView(String),
}

/// Counts per (district, decoration) pair, materialized as a dense table.
/// Row and column labels are sorted; absent combinations hold zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossTab {
    pub districts: Vec<String>,
    pub decorations: Vec<String>,
    /// counts[district_index][decoration_index]
    pub counts: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Computes the derived views. All functions are pure and skip rows whose
/// referenced fields are missing; a view with nothing left to show is an
/// error for that chart alone.
pub struct Aggregator;

impl Aggregator {
    /// Raw sequence of unit prices, for the distribution histogram.
    pub fn unit_prices(df: &DataFrame) -> Result<Vec<f64>, AggregationError> {
        let values = Self::numeric_values(df, COL_UNIT_PRICE)?;
        if values.is_empty() {
            return Err(AggregationError::EmptyView(COL_UNIT_PRICE.into()));
        }
        Ok(values)
    }

    /// District -> median unit price, ordered descending by value.
    ///
    /// Districts are first keyed in sorted order, then stably sorted by
    /// value, so equal medians keep their alphabetical relative order.
    pub fn district_median_unit_price(
        df: &DataFrame,
    ) -> Result<Vec<(String, f64)>, AggregationError> {
        let groups = Self::group_by_district(df, COL_UNIT_PRICE)?;
        let mut medians: Vec<(String, f64)> = groups
            .into_iter()
            .map(|(district, values)| {
                let median = StatsCalculator::median(&values);
                (district, median)
            })
            .collect();
        medians.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(medians)
    }

    /// District -> mean unit price, in sorted district order. Feeds the
    /// heatmap and the line chart.
    pub fn district_mean_unit_price(
        df: &DataFrame,
    ) -> Result<Vec<(String, f64)>, AggregationError> {
        let groups = Self::group_by_district(df, COL_UNIT_PRICE)?;
        Ok(groups
            .into_iter()
            .map(|(district, values)| {
                let mean = StatsCalculator::mean(&values);
                (district, mean)
            })
            .collect())
    }

    /// (built area, total price) pairs where both fields are present.
    /// The full set is returned; see [`clip_to_display`](Self::clip_to_display)
    /// for the render-time window.
    pub fn area_total_price_pairs(df: &DataFrame) -> Result<Vec<(f64, f64)>, AggregationError> {
        let areas = Self::numeric_column(df, COL_BUILT_AREA)?;
        let prices = Self::numeric_column(df, COL_TOTAL_PRICE)?;

        let pairs: Vec<(f64, f64)> = areas
            .into_iter()
            .zip(prices)
            .filter_map(|(a, p)| match (a, p) {
                (Some(a), Some(p)) if a.is_finite() && p.is_finite() => Some((a, p)),
                _ => None,
            })
            .collect();

        if pairs.is_empty() {
            return Err(AggregationError::EmptyView(COL_BUILT_AREA.into()));
        }
        Ok(pairs)
    }

    /// Restrict scatter pairs to the display window. Display-only: the
    /// regression and any other statistics use the unclipped pairs.
    pub fn clip_to_display(pairs: &[(f64, f64)]) -> Vec<(f64, f64)> {
        pairs
            .iter()
            .copied()
            .filter(|&(a, p)| {
                (0.0..=AREA_DISPLAY_MAX).contains(&a)
                    && (0.0..=TOTAL_PRICE_DISPLAY_MAX).contains(&p)
            })
            .collect()
    }

    /// Decoration category -> listing count, ordered descending by count.
    /// Equal counts keep their alphabetical relative order.
    pub fn decoration_counts(df: &DataFrame) -> Result<Vec<(String, u64)>, AggregationError> {
        let categories = Self::string_column(df, COL_DECORATION)?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for category in categories.into_iter().flatten() {
            *counts.entry(category).or_default() += 1;
        }
        if counts.is_empty() {
            return Err(AggregationError::EmptyView(COL_DECORATION.into()));
        }

        let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(sorted)
    }

    /// District -> all unit prices in that district, in sorted district
    /// order. Feeds the boxplot.
    pub fn unit_price_by_district(
        df: &DataFrame,
    ) -> Result<Vec<(String, Vec<f64>)>, AggregationError> {
        Self::group_by_district(df, COL_UNIT_PRICE)
    }

    /// (district, decoration) -> count as a dense 2D table, for the
    /// stacked bar chart.
    pub fn district_decoration_table(df: &DataFrame) -> Result<CrossTab, AggregationError> {
        let districts = Self::string_column(df, COL_DISTRICT)?;
        let decorations = Self::string_column(df, COL_DECORATION)?;

        let mut cells: HashMap<(String, String), u64> = HashMap::new();
        for (district, decoration) in districts.into_iter().zip(decorations) {
            // Rows missing either grouping key are skipped
            if let (Some(district), Some(decoration)) = (district, decoration) {
                *cells.entry((district, decoration)).or_default() += 1;
            }
        }
        if cells.is_empty() {
            return Err(AggregationError::EmptyView(COL_DISTRICT.into()));
        }

        let mut row_labels: Vec<String> = cells.keys().map(|(d, _)| d.clone()).collect();
        row_labels.sort();
        row_labels.dedup();
        let mut col_labels: Vec<String> = cells.keys().map(|(_, c)| c.clone()).collect();
        col_labels.sort();
        col_labels.dedup();

        let counts = row_labels
            .iter()
            .map(|district| {
                col_labels
                    .iter()
                    .map(|decoration| {
                        cells
                            .get(&(district.clone(), decoration.clone()))
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect()
            })
            .collect();

        Ok(CrossTab {
            districts: row_labels,
            decorations: col_labels,
            counts,
        })
    }

    /// Group a numeric column's non-null values by district, skipping rows
    /// with a null district. Groups come back in sorted district order.
    fn group_by_district(
        df: &DataFrame,
        value_col: &str,
    ) -> Result<Vec<(String, Vec<f64>)>, AggregationError> {
        let districts = Self::string_column(df, COL_DISTRICT)?;
        let values = Self::numeric_column(df, value_col)?;

        let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
        for (district, value) in districts.into_iter().zip(values) {
            if let (Some(district), Some(value)) = (district, value) {
                if value.is_finite() {
                    groups.entry(district).or_default().push(value);
                }
            }
        }
        if groups.is_empty() {
            return Err(AggregationError::EmptyView(COL_DISTRICT.into()));
        }

        let mut sorted: Vec<(String, Vec<f64>)> = groups.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sorted)
    }

    /// A column as f64 options, null where the cell is missing.
    fn numeric_column(
        df: &DataFrame,
        name: &str,
    ) -> Result<Vec<Option<f64>>, AggregationError> {
        let column = df.column(name)?;
        let casted = column.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        Ok(ca.into_iter().collect())
    }

    /// Non-null values of a numeric column.
    fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, AggregationError> {
        Ok(Self::numeric_column(df, name)?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect())
    }

    /// A categorical column as strings, null where the cell is missing.
    fn string_column(
        df: &DataFrame,
        name: &str,
    ) -> Result<Vec<Option<String>>, AggregationError> {
        let column = df.column(name)?;
        let mut out = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let value = column.get(i)?;
            if value.is_null() {
                out.push(None);
            } else {
                out.push(Some(value.to_string().trim_matches('"').to_string()));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listings() -> DataFrame {
        df!(
            "district" => [
                Some("Pudong"), Some("Pudong"), Some("Xuhui"), Some("Xuhui"),
                Some("Minhang"), None,
            ],
            "unit_price" => [
                Some(50000.0), Some(70000.0), Some(80000.0), None,
                Some(40000.0), Some(99999.0),
            ],
            "total_price" => [Some(500.0), Some(900.0), Some(1200.0), Some(20000.0), Some(300.0), None],
            "built_area" => [Some(100.0), Some(130.0), Some(150.0), Some(1500.0), Some(75.0), Some(80.0)],
            "decoration" => [Some("refined"), Some("simple"), Some("refined"), Some("refined"), None, Some("bare")],
        )
        .unwrap()
    }

    #[test]
    fn unit_prices_skip_nulls() {
        let prices = Aggregator::unit_prices(&listings()).unwrap();
        assert_eq!(prices.len(), 5);
    }

    #[test]
    fn district_medians_are_sorted_descending_with_stable_ties() {
        let df = df!(
            "district" => ["A", "A", "B"],
            "unit_price" => [100.0, 300.0, 200.0],
        )
        .unwrap();
        let view = Aggregator::district_median_unit_price(&df).unwrap();
        // Both medians are 200; ties keep the sorted key order
        assert_eq!(
            view,
            vec![("A".to_string(), 200.0), ("B".to_string(), 200.0)]
        );
    }

    #[test]
    fn district_medians_match_column_statistics() {
        let view = Aggregator::district_median_unit_price(&listings()).unwrap();
        let by_name: HashMap<&str, f64> =
            view.iter().map(|(d, v)| (d.as_str(), *v)).collect();
        assert_eq!(by_name["Pudong"], 60000.0);
        assert_eq!(by_name["Xuhui"], 80000.0);
        assert_eq!(by_name["Minhang"], 40000.0);

        let values: Vec<f64> = view.iter().map(|(_, v)| *v).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn district_means_match_column_statistics() {
        let view = Aggregator::district_mean_unit_price(&listings()).unwrap();
        let by_name: HashMap<&str, f64> =
            view.iter().map(|(d, v)| (d.as_str(), *v)).collect();
        assert!((by_name["Pudong"] - 60000.0).abs() < 1e-6);
        assert!((by_name["Xuhui"] - 80000.0).abs() < 1e-6);
    }

    #[test]
    fn scatter_pairs_require_both_fields() {
        let pairs = Aggregator::area_total_price_pairs(&listings()).unwrap();
        // The row with a null total price is dropped
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn display_clip_bounds_every_pair() {
        let pairs = Aggregator::area_total_price_pairs(&listings()).unwrap();
        let clipped = Aggregator::clip_to_display(&pairs);
        assert!(clipped
            .iter()
            .all(|&(a, p)| (0.0..=AREA_DISPLAY_MAX).contains(&a)
                && (0.0..=TOTAL_PRICE_DISPLAY_MAX).contains(&p)));
        // The (1500, 20000) outlier is outside the window
        assert_eq!(clipped.len(), 4);
        // Clipping is display-only; the source pairs are untouched
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn decoration_counts_sum_to_nonnull_entries() {
        let view = Aggregator::decoration_counts(&listings()).unwrap();
        let total: u64 = view.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 5);
        let counts: Vec<u64> = view.iter().map(|(_, c)| *c).collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn boxplot_groups_cover_each_district() {
        let view = Aggregator::unit_price_by_district(&listings()).unwrap();
        let districts: Vec<&str> = view.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(districts, vec!["Minhang", "Pudong", "Xuhui"]);
        let pudong = &view.iter().find(|(d, _)| d == "Pudong").unwrap().1;
        assert_eq!(pudong.len(), 2);
    }

    #[test]
    fn crosstab_total_matches_decoration_counts() {
        let df = listings();
        let table = Aggregator::district_decoration_table(&df).unwrap();
        // Rows with a null district or decoration are skipped by the table;
        // counts computed from the same complete rows must agree.
        let complete = df.clone().lazy().drop_nulls(None).collect().unwrap();
        let counts = Aggregator::decoration_counts(&complete).unwrap();
        let count_sum: u64 = counts.iter().map(|(_, c)| c).sum();
        let table_from_complete = Aggregator::district_decoration_table(&complete).unwrap();
        assert_eq!(table_from_complete.total(), count_sum);
        assert!(table.total() >= table_from_complete.total());
    }

    #[test]
    fn crosstab_is_dense_and_zero_filled() {
        let table = Aggregator::district_decoration_table(&listings()).unwrap();
        assert_eq!(table.districts.len(), table.counts.len());
        for row in &table.counts {
            assert_eq!(row.len(), table.decorations.len());
        }
    }

    #[test]
    fn views_are_idempotent() {
        let df = listings();
        assert_eq!(
            Aggregator::district_median_unit_price(&df).unwrap(),
            Aggregator::district_median_unit_price(&df).unwrap()
        );
        assert_eq!(
            Aggregator::decoration_counts(&df).unwrap(),
            Aggregator::decoration_counts(&df).unwrap()
        );
        assert_eq!(
            Aggregator::district_decoration_table(&df).unwrap(),
            Aggregator::district_decoration_table(&df).unwrap()
        );
    }

    #[test]
    fn empty_group_key_is_an_error() {
        let df = df!(
            "district" => [None::<&str>, None],
            "unit_price" => [1.0, 2.0],
        )
        .unwrap();
        let err = Aggregator::district_median_unit_price(&df).unwrap_err();
        assert!(matches!(err, AggregationError::EmptyView(_)));
    }
}
