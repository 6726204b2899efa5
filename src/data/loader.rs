//! CSV Data Loader Module
//! Loads the listings spreadsheet and validates its schema using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const COL_UNIT_PRICE: &str = "unit_price";
pub const COL_TOTAL_PRICE: &str = "total_price";
pub const COL_BUILT_AREA: &str = "built_area";
pub const COL_DISTRICT: &str = "district";
pub const COL_DECORATION: &str = "decoration";

/// Columns every listings file must carry. Extra columns are tolerated.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_UNIT_PRICE,
    COL_TOTAL_PRICE,
    COL_BUILT_AREA,
    COL_DISTRICT,
    COL_DECORATION,
];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("listings file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to read listings: {0}")]
    Csv(#[from] PolarsError),
    #[error("listings file is missing required column '{0}'")]
    MissingColumn(String),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load the listings CSV and verify the expected schema.
    ///
    /// Column names are matched exactly; a missing column is fatal for
    /// the whole run, so it is reported here rather than at first use.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoadError> {
        if !path.is_file() {
            return Err(LoadError::FileNotFound(path.to_path_buf()));
        }

        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        Self::validate_schema(&df)?;
        Ok(df)
    }

    fn validate_schema(df: &DataFrame) -> Result<(), LoadError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for required in REQUIRED_COLUMNS {
            if !names.iter().any(|n| n == required) {
                return Err(LoadError::MissingColumn(required.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_well_formed_file() {
        let path = write_temp_csv(
            "fangjia_loader_ok.csv",
            "unit_price,total_price,built_area,district,decoration\n\
             50000,500,100,Pudong,refined\n\
             60000,300,50,Xuhui,simple\n",
        );
        let df = DataLoader::load_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column(COL_DISTRICT).is_ok());
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = DataLoader::load_csv(Path::new("/nonexistent/listings.csv")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
    }

    #[test]
    fn renamed_column_is_fatal() {
        let path = write_temp_csv(
            "fangjia_loader_bad_schema.csv",
            "price_per_sqm,total_price,built_area,district,decoration\n\
             50000,500,100,Pudong,refined\n",
        );
        let err = DataLoader::load_csv(&path).unwrap_err();
        match err {
            LoadError::MissingColumn(col) => assert_eq!(col, COL_UNIT_PRICE),
            other => panic!("unexpected error: {other}"),
        }
    }
}
