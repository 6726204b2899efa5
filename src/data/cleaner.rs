//! Data Cleaner Module
//! Produces a copy of the listings table with incomplete rows removed.

use polars::prelude::*;

/// Drops rows containing missing values. Pure: the input frame is left
/// untouched and remains available for views that tolerate nulls.
pub struct DataCleaner;

impl DataCleaner {
    /// Return a copy of `df` with every row that has a null in any
    /// column removed.
    pub fn drop_missing(df: &DataFrame) -> PolarsResult<DataFrame> {
        df.clone().lazy().drop_nulls(None).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_every_incomplete_row() {
        let df = df!(
            "district" => [Some("Pudong"), None, Some("Xuhui")],
            "unit_price" => [Some(50000.0), Some(60000.0), None],
        )
        .unwrap();

        let cleaned = DataCleaner::drop_missing(&df).unwrap();
        assert_eq!(cleaned.height(), 1);
        assert_eq!(cleaned.column("district").unwrap().null_count(), 0);
        assert_eq!(cleaned.column("unit_price").unwrap().null_count(), 0);
        // Input is retained unmodified
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn complete_frame_passes_through() {
        let df = df!(
            "district" => ["Pudong", "Xuhui"],
            "unit_price" => [50000.0, 60000.0],
        )
        .unwrap();

        let cleaned = DataCleaner::drop_missing(&df).unwrap();
        assert_eq!(cleaned.height(), df.height());
    }

    #[test]
    fn output_never_exceeds_input() {
        let df = df!(
            "district" => [Some("A"), Some("B"), None, Some("C")],
            "unit_price" => [Some(1.0), None, Some(3.0), Some(4.0)],
        )
        .unwrap();

        let cleaned = DataCleaner::drop_missing(&df).unwrap();
        assert!(cleaned.height() <= df.height());
    }
}
